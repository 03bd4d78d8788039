//! Integration Tests: Ranked Cache Eviction
//!
//! Coverage:
//! - Trimming keeps exactly the highest-scored members
//! - Score floor removes strictly-below members only
//! - Floor and cap apply independently in one cycle
//! - Missing or failing cache reports an error

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::FakeCache;
use feed_service::cache::{CacheError, CacheKey, FeedCache};
use feed_service::jobs::cache_janitor::{CacheJanitor, EvictionPolicy, EvictionReport};

fn janitor(cache: Option<Arc<FakeCache>>) -> CacheJanitor {
    let cache: Option<Arc<dyn FeedCache>> = cache.map(|c| c as Arc<dyn FeedCache>);
    CacheJanitor::new(cache, EvictionPolicy::default(), Duration::from_secs(1))
}

async fn seed(cache: &FakeCache, scores: impl IntoIterator<Item = f64>) {
    let key = CacheKey::global_feed();
    for (i, score) in scores.into_iter().enumerate() {
        cache
            .upsert_score(&key, &format!("post-{:05}", i), score)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn trims_to_the_thousand_highest() {
    let cache = FakeCache::new();
    seed(&cache, (1..=1200).map(|s| s as f64)).await;

    let report = janitor(Some(cache.clone())).run_once().await.unwrap();

    assert_eq!(
        report,
        EvictionReport {
            removed_below_floor: 0,
            removed_beyond_cap: 200,
        }
    );
    let members = cache.members(&CacheKey::global_feed());
    assert_eq!(members.len(), 1000);
    assert_eq!(members.first().map(|m| m.1), Some(201.0));
    assert_eq!(members.last().map(|m| m.1), Some(1200.0));
}

#[tokio::test]
async fn floor_removes_strictly_below_only() {
    let cache = FakeCache::new();
    seed(&cache, [0.0, 0.05, 0.1, 5.0]).await;

    let report = janitor(Some(cache.clone())).run_once().await.unwrap();

    assert_eq!(report.removed_below_floor, 2);
    assert_eq!(report.removed_beyond_cap, 0);
    let scores: Vec<f64> = cache
        .members(&CacheKey::global_feed())
        .into_iter()
        .map(|(_, s)| s)
        .collect();
    assert_eq!(scores, vec![0.1, 5.0]);
}

#[tokio::test]
async fn floor_and_cap_apply_independently() {
    let cache = FakeCache::new();
    // 50 zero-score members plus 1050 recommendable ones.
    seed(
        &cache,
        std::iter::repeat(0.0)
            .take(50)
            .chain((1..=1050).map(|s| s as f64)),
    )
    .await;

    let report = janitor(Some(cache.clone())).run_once().await.unwrap();

    assert_eq!(report.removed_below_floor, 50);
    assert_eq!(report.removed_beyond_cap, 50);
    assert_eq!(report.total(), 100);
    let members = cache.members(&CacheKey::global_feed());
    assert_eq!(members.len(), 1000);
    assert!(members.iter().all(|(_, s)| *s >= 51.0));
}

#[tokio::test]
async fn small_set_is_left_alone() {
    let cache = FakeCache::new();
    seed(&cache, (1..=10).map(|s| s as f64)).await;

    let report = janitor(Some(cache.clone())).run_once().await.unwrap();

    assert_eq!(report.total(), 0);
    assert_eq!(cache.members(&CacheKey::global_feed()).len(), 10);
}

#[tokio::test]
async fn missing_cache_is_unavailable() {
    let result = janitor(None).run_once().await;
    assert!(matches!(result, Err(CacheError::Unavailable)));
}

#[tokio::test]
async fn failing_cache_reports_error() {
    let cache = FakeCache::new();
    cache.set_failing(true);

    let result = janitor(Some(cache)).run_once().await;
    assert!(matches!(result, Err(CacheError::Redis(_))));
}
