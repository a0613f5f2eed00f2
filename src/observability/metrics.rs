//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method and status
//! - `gateway_rejections_total` (counter): pipeline rejections by stage
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic counters)
//! - Stage labels match the pipeline: rate_limit, sanitizer,
//!   upload_rate_limit, upload_guard, media_validation

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(err) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        tracing::error!(address = %addr, error = %err, "Failed to install metrics exporter");
    } else {
        tracing::info!(address = %addr, "Metrics exporter listening");
    }
}

/// Count one served request.
pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
}

/// Count one rejection by the named pipeline stage.
pub fn record_rejection(stage: &'static str) {
    metrics::counter!("gateway_rejections_total", "stage" => stage).increment(1);
}
