//! Shutdown coordination for the scheduler.

use tokio::sync::broadcast;

/// Broadcasts a one-shot stop signal to the event loop.
///
/// The daemon subscribes one loop per [`spawn_expirator`] call; tests may
/// subscribe more.
///
/// [`spawn_expirator`]: crate::lifecycle::spawn_expirator
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscribed loop and return how many were listening.
    ///
    /// Loops that already exited are not counted.
    pub fn trigger(&self) -> usize {
        let listeners = self.tx.receiver_count();
        tracing::info!(listeners, "Shutdown triggered");
        let _ = self.tx.send(());
        listeners
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
