//! Messages from handles to the event loop.

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::coordinator::handle::{ExpiratorStats, FlushError};
use crate::expiration::{ExpirableId, PersistedExpiration};

#[derive(Debug)]
pub enum Request {
    Schedule {
        id: ExpirableId,
        expires_at: DateTime<Utc>,
    },
    Cancel {
        id: ExpirableId,
    },
    Contains {
        id: ExpirableId,
        reply: oneshot::Sender<bool>,
    },
    Stats {
        reply: oneshot::Sender<ExpiratorStats>,
    },
    Flush {
        reply: oneshot::Sender<Result<(), FlushError>>,
    },
    /// Records read from the snapshot at startup.
    Restore {
        records: Vec<PersistedExpiration>,
    },
}
