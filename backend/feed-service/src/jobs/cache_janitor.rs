//! Cache Janitor Background Job
//!
//! Keeps the global ranked feed set bounded. Each cycle:
//! 1. removes members scored strictly below the floor (non-recommendable posts)
//! 2. removes everything beyond the highest `max_entries` members
//!
//! Triggered by the scheduler through the cleanup endpoint, and optionally by
//! an in-process interval loop.

use crate::cache::{CacheError, CacheKey, FeedCache};
use crate::metrics::cache_janitor as metrics;
use crate::utils::with_timeout;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Members below this score are dropped
const SCORE_FLOOR: f64 = 0.1;

/// Members kept after trimming
const MAX_ENTRIES: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct EvictionPolicy {
    pub key: String,
    pub score_floor: f64,
    pub max_entries: usize,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            key: CacheKey::global_feed(),
            score_floor: SCORE_FLOOR,
            max_entries: MAX_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvictionReport {
    pub removed_below_floor: usize,
    pub removed_beyond_cap: usize,
}

impl EvictionReport {
    pub fn total(&self) -> usize {
        self.removed_below_floor + self.removed_beyond_cap
    }
}

pub struct CacheJanitor {
    cache: Option<Arc<dyn FeedCache>>,
    policy: EvictionPolicy,
    timeout: Duration,
}

impl CacheJanitor {
    pub fn new(
        cache: Option<Arc<dyn FeedCache>>,
        policy: EvictionPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            cache,
            policy,
            timeout,
        }
    }

    pub fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }

    /// Run one eviction cycle.
    pub async fn run_once(&self) -> Result<EvictionReport, CacheError> {
        let cycle_start = Instant::now();

        match self.evict().await {
            Ok(report) => {
                metrics::record_run("success");
                metrics::record_duration("total", cycle_start.elapsed());
                metrics::record_removed("below_floor", report.removed_below_floor);
                metrics::record_removed("beyond_cap", report.removed_beyond_cap);
                metrics::set_last_run_removed(report.total());
                tracing::info!(
                    key = %self.policy.key,
                    removed_below_floor = report.removed_below_floor,
                    removed_beyond_cap = report.removed_beyond_cap,
                    duration_ms = cycle_start.elapsed().as_millis() as u64,
                    "Cache eviction cycle completed"
                );
                Ok(report)
            }
            Err(e) => {
                metrics::record_run("error");
                metrics::record_duration("total", cycle_start.elapsed());
                tracing::error!(
                    key = %self.policy.key,
                    error = %e,
                    duration_ms = cycle_start.elapsed().as_millis() as u64,
                    "Cache eviction failed"
                );
                Err(e)
            }
        }
    }

    async fn evict(&self) -> Result<EvictionReport, CacheError> {
        let cache = self.cache.as_ref().ok_or(CacheError::Unavailable)?;
        let key = self.policy.key.as_str();

        let step_start = Instant::now();
        let removed_below_floor = with_timeout(
            self.timeout,
            cache.remove_below_score(key, self.policy.score_floor),
        )
        .await?;
        metrics::record_duration("floor", step_start.elapsed());

        // Ascending ranks 0..=-(max+1) cover everything except the top `max_entries`.
        let step_start = Instant::now();
        let stop = -(self.policy.max_entries as isize) - 1;
        let removed_beyond_cap =
            with_timeout(self.timeout, cache.remove_by_rank(key, 0, stop)).await?;
        metrics::record_duration("cap", step_start.elapsed());

        Ok(EvictionReport {
            removed_below_floor,
            removed_beyond_cap,
        })
    }
}

/// Start the in-process eviction loop
pub async fn start_cache_janitor(janitor: Arc<CacheJanitor>, interval: Duration) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        score_floor = janitor.policy().score_floor,
        max_entries = janitor.policy().max_entries,
        "Starting cache janitor background job"
    );

    loop {
        sleep(interval).await;

        // Failures are already logged and counted by run_once.
        let _ = janitor.run_once().await;
    }
}
