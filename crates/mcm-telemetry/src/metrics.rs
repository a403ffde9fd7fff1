//! Prometheus metrics for the market contract maker.
//!
//! Covers:
//! - Inbound requests by method and outcome
//! - Sanity check rejections
//! - Oracle fetch latency and failures
//! - Balance rejections and signed orders
//! - Market snapshot loads and token approvals
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! (e.g. a duplicate metric name) is a startup bug and crashes immediately.
//! These panics only occur during static initialization, never at runtime.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, Encoder,
    HistogramVec, IntCounter, TextEncoder,
};

/// Inbound JSON-RPC requests.
/// Labels: method, outcome (ok/error)
pub static REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mcm_requests_total",
        "Total JSON-RPC requests handled",
        &["method", "outcome"]
    )
    .unwrap()
});

/// Request handling latency in milliseconds.
pub static REQUEST_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "mcm_request_latency_ms",
        "JSON-RPC request handling latency in milliseconds",
        &["method"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Prices rejected by a sanity check.
/// Labels: check (not_above_zero/not_numeric/exceeds_band)
pub static SANITY_REJECTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mcm_sanity_rejections_total",
        "Total derived prices rejected by a sanity check",
        &["check"]
    )
    .unwrap()
});

/// Oracle fetch latency in milliseconds.
pub static ORACLE_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "mcm_oracle_latency_ms",
        "Oracle fetch latency in milliseconds",
        &["market"],
        vec![10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Failed oracle fetches.
pub static ORACLE_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mcm_oracle_failures_total",
        "Total oracle fetches that failed",
        &["market"]
    )
    .unwrap()
});

/// Order requests refused for balance reasons.
/// Labels: reason (missing_amount/zero_amount/insufficient_maker/insufficient_taker)
pub static BALANCE_REJECTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mcm_balance_rejections_total",
        "Total order requests refused by balance validation",
        &["reason"]
    )
    .unwrap()
});

/// Orders signed.
pub static ORDERS_SIGNED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("mcm_orders_signed_total", "Total orders signed").unwrap()
});

/// Market snapshots loaded from chain.
pub static SNAPSHOT_LOADS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mcm_snapshot_loads_total",
        "Total market contract snapshot loads",
        &["market", "outcome"]
    )
    .unwrap()
});

/// Token enablement attempts.
/// Labels: outcome (approved/already_enabled/failed)
pub static TOKEN_APPROVALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mcm_token_approvals_total",
        "Token enablement attempts",
        &["outcome"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a handled request.
    pub fn request(method: &str, outcome: &str) {
        REQUESTS_TOTAL.with_label_values(&[method, outcome]).inc();
    }

    pub fn request_latency(method: &str, latency_ms: f64) {
        REQUEST_LATENCY_MS
            .with_label_values(&[method])
            .observe(latency_ms);
    }

    /// Record a sanity check rejection.
    pub fn sanity_rejected(check: &str) {
        SANITY_REJECTIONS_TOTAL.with_label_values(&[check]).inc();
    }

    pub fn oracle_latency(market: &str, latency_ms: f64) {
        ORACLE_LATENCY_MS
            .with_label_values(&[market])
            .observe(latency_ms);
    }

    pub fn oracle_failure(market: &str) {
        ORACLE_FAILURES_TOTAL.with_label_values(&[market]).inc();
    }

    /// Record a balance validation rejection.
    pub fn balance_rejected(reason: &str) {
        BALANCE_REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn order_signed() {
        ORDERS_SIGNED_TOTAL.inc();
    }

    pub fn snapshot_loaded(market: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        SNAPSHOT_LOADS_TOTAL
            .with_label_values(&[market, outcome])
            .inc();
    }

    pub fn token_approval(outcome: &str) {
        TOKEN_APPROVALS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_recorded_metrics() {
        Metrics::request("getQuote", "ok");
        Metrics::sanity_rejected("exceeds_band");
        Metrics::order_signed();

        let text = Metrics::render().unwrap();
        assert!(text.contains("mcm_requests_total"));
        assert!(text.contains("method=\"getQuote\""));
        assert!(text.contains("mcm_sanity_rejections_total"));
        assert!(text.contains("mcm_orders_signed_total"));
    }

    #[test]
    fn test_counters_accumulate() {
        let before = BALANCE_REJECTIONS_TOTAL
            .with_label_values(&["insufficient_taker"])
            .get();
        Metrics::balance_rejected("insufficient_taker");
        Metrics::balance_rejected("insufficient_taker");
        let after = BALANCE_REJECTIONS_TOTAL
            .with_label_values(&["insufficient_taker"])
            .get();
        assert_eq!(after - before, 2.0);
    }
}
