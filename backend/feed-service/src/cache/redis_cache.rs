use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use super::{CacheResult, FeedCache};

/// Redis-backed feed cache.
///
/// The connection manager reconnects on its own; every call works on a cheap
/// clone of it so handlers never contend on a lock.
#[derive(Clone)]
pub struct RedisFeedCache {
    manager: ConnectionManager,
}

impl RedisFeedCache {
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }

    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    /// Round-trip check used by the readiness probe.
    pub async fn ping(&self) -> CacheResult<()> {
        redis::cmd("PING")
            .query_async::<_, String>(&mut self.manager.clone())
            .await
            .map_err(|e| {
                warn!("Redis PING failed: {}", e);
                e
            })?;
        Ok(())
    }
}

#[async_trait]
impl FeedCache for RedisFeedCache {
    async fn upsert_score(&self, key: &str, member: &str, score: f64) -> CacheResult<()> {
        redis::cmd("ZADD")
            .arg(key)
            .arg(score)
            .arg(member)
            .query_async::<_, ()>(&mut self.manager.clone())
            .await?;

        debug!(key = %key, member = %member, score, "Ranked cache upsert");
        Ok(())
    }

    async fn remove_below_score(&self, key: &str, floor: f64) -> CacheResult<usize> {
        // "(" makes the upper bound exclusive: members scored exactly at the floor survive.
        let removed: usize = redis::cmd("ZREMRANGEBYSCORE")
            .arg(key)
            .arg("-inf")
            .arg(format!("({}", floor))
            .query_async(&mut self.manager.clone())
            .await?;
        Ok(removed)
    }

    async fn remove_by_rank(&self, key: &str, start: isize, stop: isize) -> CacheResult<usize> {
        let removed: usize = redis::cmd("ZREMRANGEBYRANK")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query_async(&mut self.manager.clone())
            .await?;
        Ok(removed)
    }

    async fn top_members(&self, key: &str, limit: usize) -> CacheResult<Vec<(String, f64)>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let members: Vec<(String, f64)> = redis::cmd("ZREVRANGE")
            .arg(key)
            .arg(0)
            .arg(limit as isize - 1)
            .arg("WITHSCORES")
            .query_async(&mut self.manager.clone())
            .await?;
        Ok(members)
    }

    async fn get_value(&self, key: &str) -> CacheResult<Option<String>> {
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.manager.clone())
            .await?;
        Ok(value)
    }

    async fn set_value(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()> {
        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_secs)
            .arg(value)
            .query_async::<_, ()>(&mut self.manager.clone())
            .await?;

        debug!(key = %key, ttl_secs, "Cache value stored");
        Ok(())
    }
}
