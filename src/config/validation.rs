//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, capacity > 0)
//! - Check the two flush cadences are ordered
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ExpiratorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ExpiratorConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("persistence.{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error(
        "persistence.urgent_flush_interval_secs ({urgent}) exceeds flush_interval_secs ({soft})"
    )]
    UrgentSlowerThanSoft { urgent: u64, soft: u64 },

    #[error("scheduler.channel_capacity must be greater than zero")]
    ZeroCapacity,

    #[error("persistence.path must not be empty")]
    EmptyPath,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Check a parsed configuration, collecting every violation.
pub fn validate_config(config: &ExpiratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let persistence = &config.persistence;

    if persistence.flush_interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval("flush_interval_secs"));
    }
    if persistence.urgent_flush_interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval("urgent_flush_interval_secs"));
    }
    if persistence.urgent_flush_interval_secs > persistence.flush_interval_secs {
        errors.push(ValidationError::UrgentSlowerThanSoft {
            urgent: persistence.urgent_flush_interval_secs,
            soft: persistence.flush_interval_secs,
        });
    }
    if matches!(&persistence.path, Some(path) if path.as_os_str().is_empty()) {
        errors.push(ValidationError::EmptyPath);
    }

    if config.scheduler.channel_capacity == 0 {
        errors.push(ValidationError::ZeroCapacity);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
