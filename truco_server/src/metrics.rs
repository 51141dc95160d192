//! Prometheus metrics for match traffic and server health.
//!
//! Exported in Prometheus text format once [`init_metrics`] has installed
//! the exporter. Without it every call below is a no-op.
//!
//! ```rust,no_run
//! use std::net::SocketAddr;
//! use truco_server::metrics;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::matches_created_total();
//! metrics::websocket_connections_active(3);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter, scraped at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Set current active WebSocket connections count.
pub fn websocket_connections_active(count: u64) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Match Metrics
// ============================================================================

pub fn matches_created_total() {
    metrics::counter!("matches_created_total").increment(1);
}

/// Set the number of running match actors.
pub fn active_matches(count: usize) {
    metrics::gauge!("active_matches").set(count as f64);
}

pub fn hands_started_total() {
    metrics::counter!("hands_started_total").increment(1);
}

pub fn cards_played_total() {
    metrics::counter!("cards_played_total").increment(1);
}

/// Count a command answered with an `error` event, labelled by command type.
pub fn commands_rejected_total(command: &str) {
    metrics::counter!("commands_rejected_total",
        "command" => command.to_string()
    )
    .increment(1);
}

pub fn rate_limit_hits_total(endpoint: &str) {
    metrics::counter!("rate_limit_hits_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}
