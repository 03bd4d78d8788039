//! Integration Tests: Vote Write Path
//!
//! Coverage:
//! - Votes refresh the post's entry in the global ranked cache
//! - Non-recommendable posts are written with a zero score
//! - Cache outages never fail the vote
//! - Store failures and unknown posts surface to the caller

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use common::{fixed_now, FakeCache, FakeStore};
use feed_service::cache::{CacheKey, FeedCache};
use feed_service::models::VoteKind;
use feed_service::services::{Scorer, VoteService};
use feed_service::store::{FeedStore, StoreError};
use feed_service::utils::FixedClock;
use uuid::Uuid;

fn vote_service(store: Arc<FakeStore>, cache: Option<Arc<FakeCache>>) -> VoteService {
    let store: Arc<dyn FeedStore> = store;
    let cache: Option<Arc<dyn FeedCache>> = cache.map(|c| c as Arc<dyn FeedCache>);
    VoteService::new(
        store,
        cache,
        Scorer::default(),
        Arc::new(FixedClock(fixed_now())),
        Duration::from_secs(1),
        Duration::from_secs(1),
    )
}

#[tokio::test]
async fn woow_refreshes_ranked_cache_entry() {
    let store = FakeStore::new();
    let cache = FakeCache::new();
    let post_id = Uuid::new_v4();
    store.add_votable_post(post_id, fixed_now() - ChronoDuration::hours(1));

    let service = vote_service(store, Some(cache.clone()));
    let outcome = service
        .cast_vote(post_id, Uuid::new_v4(), VoteKind::Woow)
        .await
        .unwrap();

    assert_eq!(outcome.counters.woow_count, 1);
    assert!(outcome.cache_updated);
    // 10 / (1 + 2)^1.8
    assert!((outcome.ranking_score - 1.3841).abs() < 1e-4);
    assert_eq!(
        cache.score_of(&CacheKey::global_feed(), &post_id.to_string()),
        Some(outcome.ranking_score)
    );
}

#[tokio::test]
async fn net_negative_post_is_written_with_zero_score() {
    let store = FakeStore::new();
    let cache = FakeCache::new();
    let post_id = Uuid::new_v4();
    store.add_votable_post(post_id, fixed_now() - ChronoDuration::hours(1));

    let service = vote_service(store, Some(cache.clone()));
    let outcome = service
        .cast_vote(post_id, Uuid::new_v4(), VoteKind::Doow)
        .await
        .unwrap();

    assert_eq!(outcome.ranking_score, 0.0);
    assert_eq!(
        cache.score_of(&CacheKey::global_feed(), &post_id.to_string()),
        Some(0.0)
    );
}

#[tokio::test]
async fn repeated_votes_overwrite_the_member() {
    let store = FakeStore::new();
    let cache = FakeCache::new();
    let post_id = Uuid::new_v4();
    store.add_votable_post(post_id, fixed_now() - ChronoDuration::hours(1));

    let service = vote_service(store, Some(cache.clone()));
    service
        .cast_vote(post_id, Uuid::new_v4(), VoteKind::Woow)
        .await
        .unwrap();
    let second = service
        .cast_vote(post_id, Uuid::new_v4(), VoteKind::Woow)
        .await
        .unwrap();

    let members = cache.members(&CacheKey::global_feed());
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].1, second.ranking_score);
}

#[tokio::test]
async fn cache_outage_does_not_fail_the_vote() {
    let store = FakeStore::new();
    let cache = FakeCache::new();
    cache.set_failing(true);
    let post_id = Uuid::new_v4();
    store.add_votable_post(post_id, fixed_now());

    let service = vote_service(store, Some(cache));
    let outcome = service
        .cast_vote(post_id, Uuid::new_v4(), VoteKind::Adil)
        .await
        .unwrap();

    assert_eq!(outcome.counters.adil_count, 1);
    assert!(!outcome.cache_updated);
}

#[tokio::test]
async fn missing_cache_does_not_fail_the_vote() {
    let store = FakeStore::new();
    let post_id = Uuid::new_v4();
    store.add_votable_post(post_id, fixed_now());

    let outcome = vote_service(store, None)
        .cast_vote(post_id, Uuid::new_v4(), VoteKind::Woow)
        .await
        .unwrap();

    assert!(!outcome.cache_updated);
}

#[tokio::test]
async fn store_failure_is_surfaced_and_cache_untouched() {
    let store = FakeStore::new();
    let cache = FakeCache::new();
    let post_id = Uuid::new_v4();
    store.add_votable_post(post_id, fixed_now());
    store.fail(|f| f.vote = true);

    let result = vote_service(store, Some(cache.clone()))
        .cast_vote(post_id, Uuid::new_v4(), VoteKind::Woow)
        .await;

    assert!(matches!(result, Err(StoreError::Database(_))));
    assert!(cache.members(&CacheKey::global_feed()).is_empty());
}

#[tokio::test]
async fn unknown_post_is_not_found() {
    let result = vote_service(FakeStore::new(), None)
        .cast_vote(Uuid::new_v4(), Uuid::new_v4(), VoteKind::Woow)
        .await;

    assert!(matches!(result, Err(StoreError::NotFound(_))));
}
