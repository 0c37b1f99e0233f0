//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, upstream errors)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `orchestrator_requests_total` (counter): requests by method, service, status
//! - `orchestrator_request_duration_seconds` (histogram): latency by method, service
//! - `orchestrator_upstream_errors_total` (counter): failures by service, kind
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op, so tests need no setup
//! - `service` is `none` when no registered service matched

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const REQUESTS_TOTAL: &str = "orchestrator_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "orchestrator_request_duration_seconds";
pub const UPSTREAM_ERRORS_TOTAL: &str = "orchestrator_upstream_errors_total";

/// Start the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed client request.
pub fn record_request(method: &str, service: &str, status: u16, start_time: Instant) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "service" => service.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "service" => service.to_string()
    )
    .record(start_time.elapsed().as_secs_f64());
}

/// Record a failed upstream exchange.
pub fn record_upstream_error(service: &str, kind: &'static str) {
    metrics::counter!(
        UPSTREAM_ERRORS_TOTAL,
        "service" => service.to_string(),
        "kind" => kind
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_request("GET", "orders", 200, Instant::now());
        record_upstream_error("orders", "timeout");
    }
}
