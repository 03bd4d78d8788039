//! Feed Path Metrics
//!
//! Degradations during assembly and best-effort cache writes.

use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};
use std::time::Duration;

static FEED_DEGRADATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "feed_degradations_total",
        "Feed assembly steps that fell back to a default",
        &["stage"]
    )
    .expect("Failed to register feed degradations metric")
});

static FEED_ASSEMBLY_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "feed_assembly_duration_seconds",
        "Duration of feed assembly by candidate source",
        &["source"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register feed assembly duration metric")
});

static CACHE_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "feed_cache_operations_total",
        "Remote cache operations by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("Failed to register feed cache operations metric")
});

/// Record a degraded stage (primary_query/fallback_query/comment_counts/profiles/viewer_profile/spotlight)
pub fn record_degradation(stage: &str) {
    FEED_DEGRADATIONS_TOTAL.with_label_values(&[stage]).inc();
}

/// Record assembly duration labelled by where the candidates came from (primary/fallback/empty)
pub fn record_assembly_duration(source: &str, duration: Duration) {
    FEED_ASSEMBLY_DURATION_SECONDS
        .with_label_values(&[source])
        .observe(duration.as_secs_f64());
}

/// Record a cache operation outcome (hit/miss/write/error)
pub fn record_cache_operation(operation: &str, outcome: &str) {
    CACHE_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}
