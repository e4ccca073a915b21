//! Coordinator subsystem: the single-writer event loop.
//!
//! # Data Flow
//! ```text
//! ExpiratorHandle (any task)
//!     → request channel (unbounded, FIFO)
//!     → Expirator::run ─┬─ upsert / cancel / query  → Registry
//!                       ├─ expiration channel pops → store.destroy
//!                       ├─ forced queue            → store.destroy
//!                       └─ urgent / soft ticks     → SnapshotStore (blocking pool)
//! ```
//!
//! # Design Decisions
//! - Every registry mutation and every destroy happens on one task
//! - Forced expirations go through the loop's own queue, never inline
//! - At most one snapshot write in flight; callers never wait on disk I/O
//!   to register or cancel

pub mod event_loop;
pub mod handle;
pub(crate) mod request;

pub use event_loop::Expirator;
pub use handle::{ExpiratorHandle, ExpiratorStats, FlushError};
