//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_poll_ticks_dropped_total` (counter): silently dropped
//!   ticks by reason (empty_body, malformed_json)
//! - `bridge_poll_failures_total` (counter): transport/protocol
//!   failures against the status source
//! - `bridge_text_updates_total` (counter): caption changes observed
//! - `bridge_broadcast_deliveries_total` (counter): push deliveries by
//!   event kind
//! - `bridge_clients_connected` (gauge): current live subscriber count
//! - `bridge_source_connected` (gauge): 1=connected, 0=disconnected

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics exporter"),
    }
}

pub fn record_poll_drop(reason: &'static str) {
    counter!("bridge_poll_ticks_dropped_total", "reason" => reason).increment(1);
}

pub fn record_poll_failure() {
    counter!("bridge_poll_failures_total").increment(1);
}

pub fn record_text_update() {
    counter!("bridge_text_updates_total").increment(1);
}

pub fn record_broadcast(kind: &'static str, delivered: usize) {
    counter!("bridge_broadcast_deliveries_total", "kind" => kind).increment(delivered as u64);
}

pub fn set_clients_connected(count: usize) {
    gauge!("bridge_clients_connected").set(count as f64);
}

pub fn set_source_connected(connected: bool) {
    gauge!("bridge_source_connected").set(if connected { 1.0 } else { 0.0 });
}
