//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sequencer_steps_completed_total` (counter): steps finished, by variant
//! - `sequencer_runs_total` (counter): finished runs, by variant and outcome
//! - `cancellation_boundary_converted_total` (counter): cancellations turned
//!   into 499 responses
//!
//! Without an installed recorder every call here is a no-op, so unit tests
//! and library users pay nothing.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Sequencer variant label values.
pub const VARIANT_WITHOUT_CANCELLATION: &str = "without_cancellation";
pub const VARIANT_WITH_CANCELLATION: &str = "with_cancellation";
pub const VARIANT_STREAMING: &str = "streaming";

/// Run outcome label values.
pub const OUTCOME_COMPLETED: &str = "completed";
pub const OUTCOME_CANCELLED: &str = "cancelled";

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_step(variant: &'static str) {
    metrics::counter!("sequencer_steps_completed_total", "variant" => variant).increment(1);
}

pub fn record_run(variant: &'static str, outcome: &'static str) {
    metrics::counter!("sequencer_runs_total", "variant" => variant, "outcome" => outcome)
        .increment(1);
}

pub fn record_boundary_conversion() {
    metrics::counter!("cancellation_boundary_converted_total").increment(1);
}
