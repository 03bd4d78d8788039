//! Spotlight read-through cache
//!
//! The spotlight user is the highest-reputation public profile. It changes
//! slowly, so it is served from the remote cache and refreshed on miss.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{CacheKey, FeedCache};
use crate::metrics::feed as metrics;
use crate::models::AuthorProfile;
use crate::store::FeedStore;
use crate::utils::with_timeout;

pub const DEFAULT_SPOTLIGHT_TTL_SECS: u64 = 900;

#[derive(Clone)]
pub struct SpotlightService {
    store: Arc<dyn FeedStore>,
    cache: Option<Arc<dyn FeedCache>>,
    ttl_secs: u64,
    store_timeout: Duration,
    cache_timeout: Duration,
}

impl SpotlightService {
    pub fn new(
        store: Arc<dyn FeedStore>,
        cache: Option<Arc<dyn FeedCache>>,
        ttl_secs: u64,
        store_timeout: Duration,
        cache_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            ttl_secs,
            store_timeout,
            cache_timeout,
        }
    }

    /// Never fails: cache problems fall through to the store, store problems yield `None`.
    pub async fn get_spotlight_user(&self) -> Option<AuthorProfile> {
        let key = CacheKey::spotlight_user();

        let Some(cache) = self.cache.as_ref() else {
            warn!("Spotlight cache unavailable, querying store directly");
            metrics::record_cache_operation("spotlight_get", "unavailable");
            return self.load_from_store().await;
        };

        match with_timeout(self.cache_timeout, cache.get_value(&key)).await {
            Ok(Some(raw)) => match serde_json::from_str::<AuthorProfile>(&raw) {
                Ok(profile) => {
                    metrics::record_cache_operation("spotlight_get", "hit");
                    debug!(user_id = %profile.id, "Spotlight cache hit");
                    return Some(profile);
                }
                Err(e) => {
                    // Unreadable payload is treated as a miss and overwritten below.
                    warn!(error = %e, "Discarding malformed spotlight cache entry");
                    metrics::record_cache_operation("spotlight_get", "malformed");
                }
            },
            Ok(None) => {
                metrics::record_cache_operation("spotlight_get", "miss");
            }
            Err(e) => {
                warn!(error = %e, "Spotlight cache read failed, querying store directly");
                metrics::record_cache_operation("spotlight_get", "error");
                return self.load_from_store().await;
            }
        }

        let profile = self.load_from_store().await?;
        self.store_in_cache(&**cache, &key, &profile).await;
        Some(profile)
    }

    async fn load_from_store(&self) -> Option<AuthorProfile> {
        match with_timeout(self.store_timeout, self.store.top_reputation_profile()).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Spotlight lookup failed");
                metrics::record_degradation("spotlight");
                None
            }
        }
    }

    async fn store_in_cache(&self, cache: &dyn FeedCache, key: &str, profile: &AuthorProfile) {
        let payload = match serde_json::to_string(profile) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize spotlight profile");
                return;
            }
        };

        match with_timeout(
            self.cache_timeout,
            cache.set_value(key, &payload, self.ttl_secs),
        )
        .await
        {
            Ok(()) => metrics::record_cache_operation("spotlight_set", "write"),
            Err(e) => {
                warn!(error = %e, "Failed to cache spotlight profile");
                metrics::record_cache_operation("spotlight_set", "error");
            }
        }
    }
}
