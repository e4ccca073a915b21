//! Caller-facing handle to a running expirator.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::coordinator::request::Request;
use crate::store::Expirable;

/// Failure of an explicit [`ExpiratorHandle::flush`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlushError {
    #[error("persistence is disabled")]
    Disabled,

    #[error("snapshot write failed: {0}")]
    Write(String),

    #[error("expirator is not running")]
    Stopped,
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiratorStats {
    /// Pending expirations in the registry.
    pub pending: usize,
    /// Whether the startup snapshot has been applied.
    pub restored: bool,
    /// Whether either dirty flag is set.
    pub dirty: bool,
    /// Successful snapshot writes since start.
    pub snapshot_writes: u64,
    /// Failed snapshot writes since start.
    pub snapshot_failures: u64,
}

/// Cheap, cloneable handle for scheduling and cancelling expirations.
///
/// Requests from one handle are applied in the order they were made.
#[derive(Debug, Clone)]
pub struct ExpiratorHandle {
    requests: mpsc::UnboundedSender<Request>,
}

impl ExpiratorHandle {
    pub(crate) fn new(requests: mpsc::UnboundedSender<Request>) -> Self {
        Self { requests }
    }

    /// Schedule `object` to be destroyed after `ttl`, replacing any pending
    /// expiration for the same identity. A zero `ttl` expires it immediately.
    pub fn schedule_expiration<E: Expirable + ?Sized>(&self, object: &E, ttl: Duration) {
        let now = Utc::now();
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.schedule_expiration_at(object, expires_at);
    }

    /// Schedule `object` to be destroyed at `expires_at`.
    ///
    /// A deadline that is not in the future force-expires the object.
    pub fn schedule_expiration_at<E: Expirable + ?Sized>(
        &self,
        object: &E,
        expires_at: DateTime<Utc>,
    ) {
        self.send(Request::Schedule {
            id: object.expiration_id(),
            expires_at,
        });
    }

    /// Cancel the pending expiration of `object`, if any.
    pub fn cancel_expiration<E: Expirable + ?Sized>(&self, object: &E) {
        self.send(Request::Cancel {
            id: object.expiration_id(),
        });
    }

    /// Whether `object` has a pending expiration.
    ///
    /// Reflects every request this handle sent before the call.
    pub async fn has_expiration<E: Expirable + ?Sized>(&self, object: &E) -> bool {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Contains {
            id: object.expiration_id(),
            reply,
        });
        rx.await.unwrap_or(false)
    }

    /// Number of pending expirations.
    pub async fn pending_count(&self) -> usize {
        self.stats().await.map_or(0, |stats| stats.pending)
    }

    /// Scheduler statistics, or `None` if it is no longer running.
    pub async fn stats(&self) -> Option<ExpiratorStats> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Stats { reply });
        rx.await.ok()
    }

    /// Write a snapshot now, regardless of the dirty flags.
    pub async fn flush(&self) -> Result<(), FlushError> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Flush { reply });
        rx.await.unwrap_or(Err(FlushError::Stopped))
    }

    fn send(&self, request: Request) {
        if self.requests.send(request).is_err() {
            tracing::warn!("Expirator is not running, request dropped");
        }
    }
}
