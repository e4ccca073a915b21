//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the expirator from a validated configuration
//! - Spawn its event loop, subscribed to the shutdown coordinator
//! - Hand back the caller-facing handle
//!
//! # Design Decisions
//! - The snapshot loads concurrently with the loop; callers can register
//!   immediately after startup

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::ExpiratorConfig;
use crate::coordinator::{Expirator, ExpiratorHandle};
use crate::lifecycle::Shutdown;
use crate::store::ExpirableStore;

/// A spawned expirator: its handle plus the task driving the loop.
pub struct RunningExpirator {
    pub handle: ExpiratorHandle,
    pub task: JoinHandle<()>,
}

/// Spawn the expirator event loop on the current Tokio runtime.
pub fn spawn_expirator<S: ExpirableStore>(
    config: ExpiratorConfig,
    store: Arc<S>,
    shutdown: &Shutdown,
) -> RunningExpirator {
    let expirator = Expirator::new(config, store);
    let handle = expirator.handle();
    let task = tokio::spawn(expirator.run(shutdown.subscribe()));

    RunningExpirator { handle, task }
}
