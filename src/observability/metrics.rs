//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mirror_requests_total` (counter): hook evaluations by decision
//! - `mirror_deliveries_total` (counter): delivery attempts by outcome
//! - `mirror_delivery_duration_seconds` (histogram): delivery latency
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed with [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record the matcher decision for one intercepted request.
pub fn record_decision(decision: &'static str) {
    metrics::counter!("mirror_requests_total", "decision" => decision).increment(1);
}

/// Record a finished delivery attempt.
pub fn record_delivery(outcome: &'static str, started: Instant) {
    metrics::counter!("mirror_deliveries_total", "outcome" => outcome).increment(1);
    metrics::histogram!("mirror_delivery_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

/// Record a mirror dropped before delivery (admission cap or no runtime).
pub fn record_dropped(reason: &'static str) {
    metrics::counter!("mirror_deliveries_total", "outcome" => "dropped", "reason" => reason)
        .increment(1);
}
