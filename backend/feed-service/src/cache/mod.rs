//! Ephemeral cache boundary
//!
//! A sorted-set view over the remote cache for the global ranked feed, plus
//! plain get/set-with-TTL for small read-through values such as the spotlight
//! user. Everything stored here is derived; the data store stays authoritative.

mod keys;
mod redis_cache;

pub use keys::{CacheKey, CACHE_VERSION};
pub use redis_cache::RedisFeedCache;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::utils::TimedOut;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cache backend not configured")]
    Unavailable,
}

impl From<TimedOut> for CacheError {
    fn from(t: TimedOut) -> Self {
        CacheError::Timeout(t.0)
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Sorted-set and TTL operations the feed core needs from the remote cache.
///
/// Rank arguments follow Redis semantics: ranks are ascending by score and
/// negative indexes count back from the highest-scored member.
#[async_trait]
pub trait FeedCache: Send + Sync {
    /// Insert a member or replace its score.
    async fn upsert_score(&self, key: &str, member: &str, score: f64) -> CacheResult<()>;

    /// Remove every member scored strictly below `floor`. Returns how many were removed.
    async fn remove_below_score(&self, key: &str, floor: f64) -> CacheResult<usize>;

    /// Remove members whose ascending rank lies in `start..=stop`.
    async fn remove_by_rank(&self, key: &str, start: isize, stop: isize) -> CacheResult<usize>;

    /// Highest-scored members first.
    async fn top_members(&self, key: &str, limit: usize) -> CacheResult<Vec<(String, f64)>>;

    async fn get_value(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set_value(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()>;
}
