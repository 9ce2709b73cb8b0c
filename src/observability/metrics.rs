//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define dispatch metrics (requests, latency, errors, throttling)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by method, status, matched
//! - `dispatch_duration_seconds` (histogram): time spent inside the chain
//! - `dispatch_errors_total` (counter): errors reaching the boundary, by kind
//! - `rate_limited_total` (counter): requests rejected by the rate limiter
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users
//!   and tests pay nothing
//! - Labels are low-cardinality: never the raw path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and start its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_dispatch(method: &str, status: u16, matched: bool, started: Instant) {
    metrics::counter!(
        "dispatch_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "matched" => if matched { "true" } else { "false" },
    )
    .increment(1);
    metrics::histogram!("dispatch_duration_seconds", "method" => method.to_string())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_handler_error(kind: &str) {
    metrics::counter!("dispatch_errors_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_rate_limited(reason: &'static str) {
    metrics::counter!("rate_limited_total", "reason" => reason).increment(1);
}
