//! Vote write path
//!
//! The store write is authoritative and its failure is returned to the caller.
//! Refreshing the post's entry in the global ranked cache is best-effort.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::scoring::{ScoreInput, Scorer, ScoringMode};
use crate::cache::{CacheKey, FeedCache};
use crate::metrics::feed as metrics;
use crate::models::{VoteCounters, VoteKind};
use crate::store::{FeedStore, StoreResult};
use crate::utils::{with_timeout, Clock};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    #[serde(flatten)]
    pub counters: VoteCounters,
    /// Relationship-agnostic score computed from the fresh counters.
    pub ranking_score: f64,
    pub cache_updated: bool,
}

#[derive(Clone)]
pub struct VoteService {
    store: Arc<dyn FeedStore>,
    cache: Option<Arc<dyn FeedCache>>,
    scorer: Scorer,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
    cache_timeout: Duration,
}

impl VoteService {
    pub fn new(
        store: Arc<dyn FeedStore>,
        cache: Option<Arc<dyn FeedCache>>,
        scorer: Scorer,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
        cache_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            scorer,
            clock,
            store_timeout,
            cache_timeout,
        }
    }

    pub async fn cast_vote(
        &self,
        post_id: Uuid,
        voter_id: Uuid,
        kind: VoteKind,
    ) -> StoreResult<VoteOutcome> {
        let counters = with_timeout(
            self.store_timeout,
            self.store.record_vote(post_id, voter_id, kind),
        )
        .await?;

        let input = ScoreInput {
            woow_count: counters.woow_count,
            doow_count: counters.doow_count,
            created_at: counters.created_at,
            ..Default::default()
        };
        let ranking_score =
            self.scorer
                .score(&input, 1.0, ScoringMode::CacheRanking, self.clock.now());

        let cache_updated = self.refresh_ranked_entry(post_id, ranking_score).await;

        Ok(VoteOutcome {
            counters,
            ranking_score,
            cache_updated,
        })
    }

    /// Upsert even a zero score: the janitor purges non-recommendable members later.
    async fn refresh_ranked_entry(&self, post_id: Uuid, score: f64) -> bool {
        let Some(cache) = self.cache.as_ref() else {
            metrics::record_cache_operation("ranked_upsert", "unavailable");
            return false;
        };

        let key = CacheKey::global_feed();
        let member = post_id.to_string();

        match with_timeout(self.cache_timeout, cache.upsert_score(&key, &member, score)).await {
            Ok(()) => {
                debug!(post_id = %post_id, score, "Ranked cache entry refreshed");
                metrics::record_cache_operation("ranked_upsert", "write");
                true
            }
            Err(e) => {
                warn!(post_id = %post_id, error = %e, "Ranked cache update failed");
                metrics::record_cache_operation("ranked_upsert", "error");
                false
            }
        }
    }
}
