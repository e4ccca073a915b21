//! Metrics collection and exposition.
//!
//! # Metrics
//! - `expirator_registrations_total` (counter): accepted registrations
//! - `expirator_cancellations_total` (counter): cancellations that removed an entry
//! - `expirator_expirations_total` (counter): destroys by cause (timer, forced)
//! - `expirator_destroy_misses_total` (counter): store lookups that found nothing
//! - `expirator_stale_fires_total` (counter): timer fires ignored as stale
//! - `expirator_dropped_fires_total` (counter): fires dropped on a full channel
//! - `expirator_snapshot_writes_total` (counter): snapshot writes by result
//! - `expirator_pending` (gauge): current registry size

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_registration() {
    counter!("expirator_registrations_total").increment(1);
}

pub fn record_cancellation() {
    counter!("expirator_cancellations_total").increment(1);
}

pub fn record_expiration(cause: &'static str) {
    counter!("expirator_expirations_total", "cause" => cause).increment(1);
}

pub fn record_destroy_miss() {
    counter!("expirator_destroy_misses_total").increment(1);
}

pub fn record_stale_fire() {
    counter!("expirator_stale_fires_total").increment(1);
}

pub fn record_dropped_fire() {
    counter!("expirator_dropped_fires_total").increment(1);
}

pub fn record_snapshot_write(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!("expirator_snapshot_writes_total", "result" => result).increment(1);
}

pub fn record_pending(count: usize) {
    gauge!("expirator_pending").set(count as f64);
}
