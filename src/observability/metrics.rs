//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bids_total` (counter): bids by outcome
//! - `bid_duration_seconds` (histogram): request-to-outcome latency by outcome
//! - `rpc_health` (gauge): 1=healthy, 0=unhealthy, per endpoint
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished bid.
pub fn record_bid(outcome: &'static str, started: Instant) {
    counter!("bids_total", "outcome" => outcome).increment(1);
    histogram!("bid_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

/// Record RPC reachability.
pub fn record_rpc_health(endpoint: &str, healthy: bool) {
    gauge!("rpc_health", "endpoint" => endpoint.to_string()).set(if healthy { 1.0 } else { 0.0 });
}
