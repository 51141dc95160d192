//! Structured logging configuration.
//!
//! The library logs through the `log` facade; `init` installs a tracing
//! subscriber that also picks those records up.

use sha2::{Digest, Sha256};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging.
///
/// Levels come from `RUST_LOG`, falling back to `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use truco_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Short stable digest of a player token, safe to put in logs.
///
/// ```
/// use truco_server::logging::token_fingerprint;
///
/// let fingerprint = token_fingerprint("player-secret");
/// assert_eq!(fingerprint.len(), 12);
/// assert!(!fingerprint.contains("secret"));
/// ```
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

/// Log security event with structured data
///
/// # Example
///
/// ```
/// use truco_server::logging::log_security_event;
///
/// log_security_event("rate_limited", Some("c0ffee"), Some("match_1"), "Burst limit hit");
/// ```
pub fn log_security_event(
    event_type: &str,
    connection_id: Option<&str>,
    match_id: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        connection_id = connection_id,
        match_id = match_id,
        "SECURITY: {}",
        message
    );
}

/// Log performance metric. Anything over a second is reported as slow.
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_fingerprint_is_stable() {
        assert_eq!(token_fingerprint("abc"), token_fingerprint("abc"));
        assert_ne!(token_fingerprint("abc"), token_fingerprint("abd"));
        assert!(token_fingerprint("").chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_log_helpers_do_not_panic() {
        log_security_event("test_event", Some("conn"), None, "Test message");
        log_performance("test_operation", 500, Some("metadata"));
        log_performance("slow_operation", 2000, None);
    }
}
