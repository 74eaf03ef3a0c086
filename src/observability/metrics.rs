//! Metrics collection and exposition.
//!
//! # Metrics
//! - `home_dispatch_total` (counter): dispatched requests by outcome
//! - `home_dispatch_duration_seconds` (histogram): dispatch latency by outcome
//! - `home_delegation_total` (counter): service delegation decisions
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Labels are closed sets (outcome and decision names), never paths

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder with its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_dispatch(outcome: &'static str, start: Instant) {
    ::metrics::counter!("home_dispatch_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("home_dispatch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_delegation(decision: &'static str) {
    ::metrics::counter!("home_delegation_total", "decision" => decision).increment(1);
}
