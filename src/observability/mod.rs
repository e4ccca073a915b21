//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Coordinator, timers, snapshot store produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (id, counts, durations) on every scheduler event
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
