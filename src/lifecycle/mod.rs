//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Expirator::new → spawn event loop (snapshot loads concurrently)
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → loop exits → optional final snapshot
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - The event loop never exits on its own; only the shutdown signal stops it
//! - A final snapshot is written only when configured
//! - Remaining timers are disarmed when the registry drops

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{spawn_expirator, RunningExpirator};
