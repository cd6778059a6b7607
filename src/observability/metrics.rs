//! Metrics collection and exposition.
//!
//! # Metrics
//! - `chaos_requests_total` (counter): proxied requests by method, status, outcome
//! - `chaos_request_duration_seconds` (histogram): end-to-end latency, injected waits included
//! - `chaos_faults_injected_total` (counter): injected faults by kind
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

/// Record a finished proxied request.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "chaos_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("chaos_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record one injected fault (`delay`, `error` or `timeout`).
pub fn record_fault(kind: &'static str) {
    metrics::counter!("chaos_faults_injected_total", "kind" => kind).increment(1);
}
