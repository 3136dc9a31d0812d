//! Metrics collection and exposition.
//!
//! # Metrics
//! - `jobs_api_requests_total` (counter): requests by method, status
//! - `jobs_api_request_duration_seconds` (histogram): latency by method
//! - `jobs_api_rate_limited_total` (counter): requests refused by the limiter
//! - `jobs_api_auth_failures_total` (counter): guard refusals by reason
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "jobs_api_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "jobs_api_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    metrics::counter!("jobs_api_rate_limited_total").increment(1);
}

pub fn record_auth_failure(reason: &'static str) {
    metrics::counter!("jobs_api_auth_failures_total", "reason" => reason).increment(1);
}

/// Middleware recording the final status and latency of every request.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let response = next.run(request).await;
    record_request(method.as_str(), response.status().as_u16(), start);
    response
}
