//! Expiration bookkeeping subsystem.
//!
//! # Data Flow
//! ```text
//! Coordinator upsert:
//!     → timer.rs (arm one-shot timer for expires_at − now)
//!     → registry.rs (install record, stop any previous timer)
//!
//! Timer fires:
//!     → ExpirationTicket { id, generation }
//!     → bounded expiration channel
//!     → Coordinator (take_if_current → destroy)
//! ```
//!
//! # Design Decisions
//! - The registry is plain data owned by the coordinator; it has no locks
//! - Each record owns its timer handle; dropping the record disarms it
//! - Tickets carry the arm generation so stale fires can be told apart

pub mod record;
pub mod registry;
pub mod timer;

pub use record::{ExpirableId, ExpirationRecord, PersistedExpiration};
pub use registry::Registry;
pub use timer::{ExpirationCause, ExpirationTicket, TimerHandle, Timers};
