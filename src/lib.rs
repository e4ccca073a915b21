//! Time-based expiration scheduler.
//!
//! Callers register identifiable objects with a time-to-live; when it
//! elapses the scheduler asks an external store to destroy the object.
//! Pending expirations are snapshotted to disk on a throttled cadence and
//! restored at startup, force-expiring anything that came due while the
//! process was down.

pub mod config;
pub mod control;
pub mod coordinator;
pub mod expiration;
pub mod lifecycle;
pub mod observability;
pub mod persistence;
pub mod store;

pub use config::schema::ExpiratorConfig;
pub use coordinator::{Expirator, ExpiratorHandle, ExpiratorStats, FlushError};
pub use expiration::ExpirableId;
pub use lifecycle::Shutdown;
pub use store::{Expirable, ExpirableStore};
