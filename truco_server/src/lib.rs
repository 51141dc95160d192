//! HTTP and WebSocket front end for live Truco matches.
//!
//! - [`api`]: router, REST handlers and WebSocket sessions
//! - [`config`]: environment and command line configuration
//! - [`logging`]: tracing subscriber and structured log helpers
//! - [`metrics`]: Prometheus counters and gauges

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
