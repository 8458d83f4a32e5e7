//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): finished jobs by topic and outcome
//! - `gateway_pipeline_duration_seconds` (histogram): pipeline latency by topic
//! - `gateway_queue_depth` (gauge): jobs waiting for a worker
//! - `gateway_client_canceled_total` (counter): callers that gave up, by stage

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished pipeline run. `outcome` is `SUCCESS`, `UPSTREAM_ERROR`,
/// or a gateway error code.
pub fn record_job(topic: &str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "topic" => topic.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "gateway_pipeline_duration_seconds",
        "topic" => topic.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_queue_depth(depth: usize) {
    metrics::gauge!("gateway_queue_depth").set(depth as f64);
}

/// `stage` is `enqueue` or `reply`.
pub fn record_client_canceled(stage: &'static str) {
    metrics::counter!("gateway_client_canceled_total", "stage" => stage).increment(1);
}
