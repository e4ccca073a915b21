//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! expiration scheduler. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExpiratorConfig {
    /// Snapshot persistence settings.
    pub persistence: PersistenceConfig,

    /// Timer and channel settings.
    pub scheduler: SchedulerConfig,

    /// Reference directory store used by the daemon.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Snapshot file. Persistence is disabled when unset.
    pub path: Option<PathBuf>,

    /// Soft flush interval in seconds (flush if anything changed).
    pub flush_interval_secs: u64,

    /// Urgent flush interval in seconds (flush if registrations changed).
    pub urgent_flush_interval_secs: u64,

    /// Write a final snapshot when the scheduler shuts down.
    pub flush_on_shutdown: bool,
}

impl PersistenceConfig {
    pub fn enabled(&self) -> bool {
        self.path.is_some()
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn urgent_flush_interval(&self) -> Duration {
        Duration::from_secs(self.urgent_flush_interval_secs)
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: None,
            flush_interval_secs: 30,
            urgent_flush_interval_secs: 1,
            flush_on_shutdown: true,
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Capacity of the expiration channel between timers and the coordinator.
    pub channel_capacity: usize,

    /// How long a fired timer waits on a full channel before dropping its fire.
    pub fire_send_timeout_secs: u64,
}

impl SchedulerConfig {
    pub fn fire_send_timeout(&self) -> Duration {
        Duration::from_secs(self.fire_send_timeout_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
            fire_send_timeout_secs: 30,
        }
    }
}

/// Directory store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory whose files are the expirable objects.
    pub directory: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./data"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_disable_persistence() {
        let config = ExpiratorConfig::default();
        assert!(!config.persistence.enabled());
        assert_eq!(config.persistence.flush_interval(), Duration::from_secs(30));
        assert_eq!(config.persistence.urgent_flush_interval(), Duration::from_secs(1));
        assert_eq!(config.scheduler.channel_capacity, 1000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ExpiratorConfig = toml::from_str(
            r#"
            [persistence]
            path = "/var/lib/expirator/expirations.json"
            "#,
        )
        .unwrap();

        assert!(config.persistence.enabled());
        assert_eq!(config.persistence.flush_interval_secs, 30);
        assert!(config.persistence.flush_on_shutdown);
        assert_eq!(config.observability.log_level, "info");
    }
}
