//! One-shot expiration timers.
//!
//! A timer sleeps until its deadline and then pushes a ticket onto the
//! expiration channel. It never touches the registry or the store.

use std::time::Duration;
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tokio::task::AbortHandle;

use crate::expiration::record::ExpirableId;
use crate::observability::metrics;

/// Why an identity is being expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationCause {
    /// An armed timer fired. Only honoured if the registry still holds
    /// the record armed with this generation.
    Timer { generation: u64 },
    /// The deadline had already passed at registration or load time.
    Forced,
}

impl ExpirationCause {
    pub fn label(&self) -> &'static str {
        match self {
            ExpirationCause::Timer { .. } => "timer",
            ExpirationCause::Forced => "forced",
        }
    }
}

/// Message delivered to the coordinator when something should expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirationTicket {
    pub id: ExpirableId,
    pub cause: ExpirationCause,
}

/// Owned handle to an armed timer. Dropping it disarms the timer.
#[derive(Debug)]
pub struct TimerHandle {
    abort: AbortHandle,
}

impl TimerHandle {
    /// Stop the timer. Idempotent; a no-op once the timer has fired.
    pub fn stop(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Arms timers that feed the shared expiration channel.
#[derive(Clone)]
pub struct Timers {
    tx: mpsc::Sender<ExpirationTicket>,
    send_timeout: Duration,
}

impl Timers {
    /// Create the timer factory and the receiving end of the expiration channel.
    pub fn new(
        capacity: usize,
        send_timeout: Duration,
    ) -> (Self, mpsc::Receiver<ExpirationTicket>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, send_timeout }, rx)
    }

    /// Sender for injecting tickets directly.
    #[cfg(test)]
    pub(crate) fn sender(&self) -> mpsc::Sender<ExpirationTicket> {
        self.tx.clone()
    }

    /// Arm a one-shot timer that enqueues a ticket for `id` after `delay`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn arm(&self, id: ExpirableId, generation: u64, delay: Duration) -> TimerHandle {
        let tx = self.tx.clone();
        let send_timeout = self.send_timeout;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let ticket = ExpirationTicket {
                id,
                cause: ExpirationCause::Timer { generation },
            };

            // A full channel blocks the timer for at most `send_timeout`.
            match tx.send_timeout(ticket, send_timeout).await {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(ticket)) => {
                    tracing::error!(
                        id = %ticket.id,
                        timeout_secs = send_timeout.as_secs(),
                        "Expiration channel full, dropping timer fire"
                    );
                    metrics::record_dropped_fire();
                }
                Err(SendTimeoutError::Closed(ticket)) => {
                    tracing::debug!(id = %ticket.id, "Coordinator gone, timer fire discarded");
                }
            }
        });

        TimerHandle {
            abort: task.abort_handle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_enqueues_ticket_after_delay() {
        let (timers, mut rx) = Timers::new(8, Duration::from_secs(1));
        let start = tokio::time::Instant::now();
        let _handle = timers.arm("a".into(), 7, Duration::from_secs(3));

        let ticket = rx.recv().await.unwrap();
        assert_eq!(ticket.id, ExpirableId::from("a"));
        assert_eq!(ticket.cause, ExpirationCause::Timer { generation: 7 });
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_timer_never_fires() {
        let (timers, mut rx) = Timers::new(8, Duration::from_secs(1));
        let handle = timers.arm("a".into(), 1, Duration::from_secs(1));
        handle.stop();
        handle.stop();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_disarms_timer() {
        let (timers, mut rx) = Timers::new(8, Duration::from_secs(1));
        drop(timers.arm("a".into(), 1, Duration::from_secs(1)));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_channel_drops_fire_after_timeout() {
        let (timers, mut rx) = Timers::new(1, Duration::from_secs(2));
        let _first = timers.arm("a".into(), 1, Duration::from_secs(1));
        let second = timers.arm("b".into(), 2, Duration::from_secs(2));

        // Nobody drains the channel: "b" gives up after the send timeout.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(second.is_finished());

        assert_eq!(rx.recv().await.unwrap().id, ExpirableId::from("a"));
        assert!(rx.try_recv().is_err());
    }
}
