//! Snapshot persistence subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     snapshot.rs load (blocking pool) → Coordinator restore → upsert path
//!
//! Steady state:
//!     registry mutation → flags.rs (urgent / soft)
//!     urgent tick (1s)  → flush if urgent
//!     soft tick (30s)   → flush if either flag
//!     flush → snapshot.rs save (temp file + rename) → flags cleared
//! ```
//!
//! # Design Decisions
//! - A quiescent scheduler performs no disk writes
//! - Missing or corrupt snapshots mean "no prior state", never a startup failure
//! - Save failures keep the flags set so the next tick retries

pub mod flags;
pub mod snapshot;

pub use flags::DirtyFlags;
pub use snapshot::{SnapshotError, SnapshotMap, SnapshotStore};
