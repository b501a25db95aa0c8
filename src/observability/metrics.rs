//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): total requests by method, status, backend
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_session_affinity_total` (counter): affinity outcomes by event
//!   (`hint_honored` when the hinted backend served the request,
//!   `re_pinned` when selection diverged from the hint)
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations in the recorder)
//! - Prometheus exporter is optional and bound on its own address

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter"),
    }
}

/// Record one proxied request.
pub fn record_request(method: &str, status: u16, backend: &str, start_time: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "backend" => backend.to_string(),
    )
    .increment(1);

    histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
    )
    .record(start_time.elapsed().as_secs_f64());
}

/// Record a session affinity outcome.
pub fn record_affinity(event: &'static str) {
    counter!("proxy_session_affinity_total", "event" => event).increment(1);
}
