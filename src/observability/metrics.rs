//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): requests by service, status
//! - `balancer_request_duration_seconds` (histogram): dispatch latency by service
//! - `balancer_server_alive` (gauge): 1=alive, 0=dead, by service and server
//!
//! # Design Decisions
//! - Unmatched requests are recorded under the service label `none`
//! - The exporter runs its own HTTP listener, separate from dispatch traffic

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

pub const REQUESTS_TOTAL: &str = "balancer_requests_total";
pub const REQUEST_DURATION: &str = "balancer_request_duration_seconds";
pub const SERVER_ALIVE: &str = "balancer_server_alive";

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(
            address = %addr,
            error = %e,
            "Failed to install metrics exporter"
        ),
    }
}

/// Record one dispatched request.
pub fn record_request(service: &str, status: u16, start: Instant) {
    counter!(
        REQUESTS_TOTAL,
        "service" => service.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(REQUEST_DURATION, "service" => service.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record the current liveness of one server.
pub fn record_server_liveness(service: &str, server: &str, alive: bool) {
    gauge!(
        SERVER_ALIVE,
        "service" => service.to_string(),
        "server" => server.to_string()
    )
    .set(if alive { 1.0 } else { 0.0 });
}
