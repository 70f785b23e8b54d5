//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_forward_total` (counter): forwarded calls by endpoint, outcome
//! - `relay_forward_duration_seconds` (histogram): latency by endpoint
//! - `relay_file_downloads_total` (counter): proxied downloads by outcome
//! - `relay_file_bytes_total` (counter): bytes relayed to clients
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_forward(endpoint: &str, success: bool, start: Instant) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(
        "relay_forward_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "relay_forward_duration_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Outcome is one of `completed`, `upstream_error`, `aborted`, `rejected`.
pub fn record_download(outcome: &'static str, bytes: u64) {
    metrics::counter!("relay_file_downloads_total", "outcome" => outcome).increment(1);
    metrics::counter!("relay_file_bytes_total").increment(bytes);
}
