//! Prometheus metrics for the Surge daemon
//!
//! Exposes quote volume, failures and latency in Prometheus text format.

use std::sync::LazyLock;
use std::time::Duration;

use prometheus::{
    Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use surge_core::SurgeTier;

/// Global Prometheus registry for Surge metrics
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let registry = Registry::new();

    registry.register(Box::new(QUOTES_TOTAL.clone())).unwrap();
    registry.register(Box::new(QUOTE_FAILURES_TOTAL.clone())).unwrap();
    registry.register(Box::new(QUOTE_DURATION.clone())).unwrap();
    registry.register(Box::new(PREDICTED_DEMAND.clone())).unwrap();
    registry.register(Box::new(POLICY_FALLBACK_ACTIVE.clone())).unwrap();

    registry
});

/// Total quotes by surge tier
pub static QUOTES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("surge_quotes_total", "Total number of quotes served"),
        &["tier"],
    )
    .unwrap()
});

/// Failed quotes by error kind
pub static QUOTE_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("surge_quote_failures_total", "Total number of failed quotes"),
        &["kind"],
    )
    .unwrap()
});

/// Time spent computing a quote (excluding the cosmetic delay)
pub static QUOTE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "surge_quote_duration_seconds",
            "Quote computation duration in seconds",
        )
        .buckets(vec![0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05]),
    )
    .unwrap()
});

/// Distribution of predicted demand
pub static PREDICTED_DEMAND: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("surge_predicted_demand", "Predicted ride demand per quote")
            .buckets(vec![10.0, 25.0, 50.0, 100.0, 200.0, 400.0, 800.0]),
    )
    .unwrap()
});

/// 1 while the daemon serves from a fallback zero table
pub static POLICY_FALLBACK_ACTIVE: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "surge_policy_fallback_active",
        "Whether the policy table is a fallback zero table",
    )
    .unwrap()
});

pub fn record_quote(tier: SurgeTier, predicted_demand: u64, elapsed: Duration) {
    QUOTES_TOTAL.with_label_values(&[tier.as_str()]).inc();
    QUOTE_DURATION.observe(elapsed.as_secs_f64());
    PREDICTED_DEMAND.observe(predicted_demand as f64);
}

pub fn record_quote_failure(kind: &str) {
    QUOTE_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

/// Render all metrics in Prometheus text format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_else(|e| format!("# error encoding metrics: {e}\n"))
}
