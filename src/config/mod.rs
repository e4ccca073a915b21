//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ExpiratorConfig (validated, immutable)
//!     → handed to the coordinator and the daemon wiring
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - No persistence path means persistence is disabled, not an error
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ExpiratorConfig;
pub use schema::ObservabilityConfig;
pub use schema::PersistenceConfig;
pub use schema::SchedulerConfig;
pub use schema::StoreConfig;
