//! Prometheus metrics for the arcade backend.
//!
//! Counters and histograms are recorded through the `metrics` facade and are
//! no-ops until [`init_metrics`] installs the Prometheus exporter.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pa_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/auth/login/", 200);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Increments the total HTTP request counter with method, path, and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Auth Metrics
// ============================================================================

pub fn registrations_total() {
    metrics::counter!("registrations_total").increment(1);
}

pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

pub fn logouts_total() {
    metrics::counter!("logouts_total").increment(1);
}

pub fn token_refreshes_total(success: bool) {
    metrics::counter!("token_refreshes_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Revocation entries removed by the background purge
pub fn blacklist_purged_total(count: u64) {
    metrics::counter!("blacklist_purged_total").increment(count);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Count a recorded session and its score distribution.
pub fn game_session_recorded(score: i64, level_reached: i32) {
    metrics::counter!("game_sessions_recorded_total").increment(1);
    metrics::histogram!("game_session_score").record(score as f64);
    metrics::histogram!("game_session_level").record(f64::from(level_reached));
}
