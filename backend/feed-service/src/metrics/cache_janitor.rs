//! Cache Janitor Metrics
//!
//! Prometheus metrics for the ranked-cache eviction job

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};
use std::time::Duration;

static JANITOR_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cache_janitor_runs_total",
        "Total cache eviction cycles (success/error)",
        &["status"]
    )
    .expect("Failed to register cache janitor runs metric")
});

static JANITOR_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "cache_janitor_duration_seconds",
        "Duration of cache eviction operations",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("Failed to register cache janitor duration metric")
});

static MEMBERS_REMOVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cache_janitor_members_removed_total",
        "Sorted-set members removed by the janitor",
        &["reason"]
    )
    .expect("Failed to register cache janitor removals metric")
});

static LAST_RUN_REMOVED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "cache_janitor_last_run_removed",
        "Members removed in the last eviction cycle"
    )
    .expect("Failed to register cache janitor last run metric")
});

/// Record janitor run result (success/error)
pub fn record_run(status: &str) {
    JANITOR_RUNS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_duration(operation: &str, duration: Duration) {
    JANITOR_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record removals by reason (below_floor/beyond_cap)
pub fn record_removed(reason: &str, count: usize) {
    MEMBERS_REMOVED_TOTAL
        .with_label_values(&[reason])
        .inc_by(count as u64);
}

pub fn set_last_run_removed(count: usize) {
    LAST_RUN_REMOVED.set(count as i64);
}
