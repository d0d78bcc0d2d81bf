//! Metrics collection and exposition.
//!
//! # Metrics
//! - `front_door_rate_limited_total` (counter): rejected requests by route
//! - `front_door_bootstrap_total` (counter): bootstrap attempts by outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rate_limited(route: &str) {
    metrics::counter!("front_door_rate_limited_total", "route" => route.to_string()).increment(1);
}

pub fn record_bootstrap(outcome: &'static str) {
    metrics::counter!("front_door_bootstrap_total", "outcome" => outcome).increment(1);
}
