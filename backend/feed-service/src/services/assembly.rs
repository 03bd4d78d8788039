//! Feed assembly
//!
//! Fetches candidates for a viewer, enriches them with comment counts and
//! author identity, scores them and merges three ranked views into the final
//! feed. Every upstream failure degrades to a default; assembly itself never
//! fails.
//!
//! Pipeline:
//! 1. viewer profile + candidates (primary query, reverse-chronological fallback)
//! 2. comment counts + author profiles, one batch call each
//! 3. identity resolution and privacy redaction
//! 4. scoring and ordering
//! 5. personal / global / wildcard partition and interleave

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::merge::interleave;
use super::scoring::{velocity, ScoreInput, Scorer, ScoringMode};
use super::spotlight::SpotlightService;
use crate::metrics::feed as metrics;
use crate::models::{AuthorProfile, AuthorView, CandidateRow, EnrichedPost, FeedResponse};
use crate::store::FeedStore;
use crate::utils::{with_timeout, Clock};

#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    /// Maximum posts returned to the client.
    pub feed_limit: usize,
    /// Rows requested from the primary candidate query.
    pub candidate_limit: i64,
    /// Rows requested from the reverse-chronological fallback.
    pub fallback_limit: i64,
    pub global_limit: usize,
    /// A post needs strictly more woows than this to be a wildcard.
    pub wildcard_min_woows: i64,
    pub wildcard_limit: usize,
    /// Relevance multiplier for posts by followed authors.
    pub followed_relevance: f64,
    pub store_timeout: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            feed_limit: 50,
            candidate_limit: 200,
            fallback_limit: 50,
            global_limit: 50,
            wildcard_min_woows: 2,
            wildcard_limit: 10,
            followed_relevance: 1.5,
            store_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Clone)]
pub struct FeedAssembler {
    store: Arc<dyn FeedStore>,
    spotlight: SpotlightService,
    clock: Arc<dyn Clock>,
    scorer: Scorer,
    settings: FeedSettings,
}

/// The three ranked views the interleaver combines.
#[derive(Debug, Default)]
pub struct FeedSources {
    pub personal: Vec<EnrichedPost>,
    pub global: Vec<EnrichedPost>,
    pub wildcard: Vec<EnrichedPost>,
}

impl FeedAssembler {
    pub fn new(
        store: Arc<dyn FeedStore>,
        spotlight: SpotlightService,
        clock: Arc<dyn Clock>,
        scorer: Scorer,
        settings: FeedSettings,
    ) -> Self {
        Self {
            store,
            spotlight,
            clock,
            scorer,
            settings,
        }
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    pub async fn assemble(&self, viewer_id: Uuid) -> FeedResponse {
        let (posts, spotlight) = futures::join!(
            self.assemble_posts(viewer_id),
            self.spotlight.get_spotlight_user()
        );

        FeedResponse { posts, spotlight }
    }

    async fn assemble_posts(&self, viewer_id: Uuid) -> Vec<EnrichedPost> {
        let started = Instant::now();

        let (viewer, (rows, source)) =
            futures::join!(self.viewer_profile(viewer_id), self.load_candidates(viewer_id));

        if rows.is_empty() {
            metrics::record_assembly_duration(source, started.elapsed());
            return Vec::new();
        }

        let post_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let author_ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.author_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let (comment_counts, profiles) = futures::join!(
            self.comment_counts(&post_ids),
            self.author_profiles(&author_ids)
        );

        let now = self.clock.now();
        let mut posts: Vec<EnrichedPost> = rows
            .into_iter()
            .map(|row| {
                let author = resolve_author(&row, viewer_id, viewer.as_ref(), &profiles);
                let comment_count = comment_counts.get(&row.id).copied().unwrap_or(0);
                self.enrich(row, author, comment_count, now)
            })
            .collect();

        sort_by_score(&mut posts);

        let sources = partition(&posts, viewer_id, &self.settings, now);
        let feed = merge_sources(sources, self.settings.feed_limit);

        metrics::record_assembly_duration(source, started.elapsed());
        info!(
            viewer_id = %viewer_id,
            source,
            candidates = posts.len(),
            returned = feed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Feed assembled"
        );

        feed
    }

    async fn viewer_profile(&self, viewer_id: Uuid) -> Option<AuthorProfile> {
        match with_timeout(self.settings.store_timeout, self.store.viewer_profile(viewer_id)).await
        {
            Ok(profile) => profile,
            Err(e) => {
                warn!(viewer_id = %viewer_id, error = %e, "Viewer profile lookup failed");
                metrics::record_degradation("viewer_profile");
                None
            }
        }
    }

    /// Primary ranked query, falling back to the most recent posts on error,
    /// timeout or an empty result.
    async fn load_candidates(&self, viewer_id: Uuid) -> (Vec<CandidateRow>, &'static str) {
        match with_timeout(
            self.settings.store_timeout,
            self.store
                .ranked_candidates(viewer_id, self.settings.candidate_limit),
        )
        .await
        {
            Ok(rows) if !rows.is_empty() => return (rows, "primary"),
            Ok(_) => {
                debug!(viewer_id = %viewer_id, "Primary candidate query empty, using fallback");
            }
            Err(e) => {
                warn!(
                    viewer_id = %viewer_id,
                    error = %e,
                    "Primary candidate query failed, using fallback"
                );
                metrics::record_degradation("primary_query");
            }
        }

        match with_timeout(
            self.settings.store_timeout,
            self.store
                .recent_candidates(viewer_id, self.settings.fallback_limit),
        )
        .await
        {
            Ok(rows) if !rows.is_empty() => (rows, "fallback"),
            Ok(rows) => (rows, "empty"),
            Err(e) => {
                warn!(viewer_id = %viewer_id, error = %e, "Fallback candidate query failed");
                metrics::record_degradation("fallback_query");
                (Vec::new(), "empty")
            }
        }
    }

    async fn comment_counts(&self, post_ids: &[Uuid]) -> HashMap<Uuid, i64> {
        match with_timeout(self.settings.store_timeout, self.store.comment_counts(post_ids)).await {
            Ok(counts) => counts,
            Err(e) => {
                warn!(posts = post_ids.len(), error = %e, "Comment count lookup failed");
                metrics::record_degradation("comment_counts");
                HashMap::new()
            }
        }
    }

    async fn author_profiles(&self, author_ids: &[Uuid]) -> HashMap<Uuid, AuthorProfile> {
        match with_timeout(
            self.settings.store_timeout,
            self.store.profiles_by_ids(author_ids),
        )
        .await
        {
            Ok(profiles) => profiles,
            Err(e) => {
                warn!(authors = author_ids.len(), error = %e, "Author profile lookup failed");
                metrics::record_degradation("profiles");
                HashMap::new()
            }
        }
    }

    fn enrich(
        &self,
        row: CandidateRow,
        author: AuthorView,
        comment_count: i64,
        now: DateTime<Utc>,
    ) -> EnrichedPost {
        let event_at = row.event_at();
        let input = ScoreInput {
            woow_count: row.woow_count,
            doow_count: row.doow_count,
            comment_count,
            created_at: row.created_at,
            is_followed: row.is_followed,
            is_event: row.is_event,
            event_at,
        };
        let relevance = if row.is_followed {
            self.settings.followed_relevance
        } else {
            1.0
        };
        let score = self
            .scorer
            .score(&input, relevance, ScoringMode::Feed, now);

        EnrichedPost {
            id: row.id,
            author_id: row.author_id,
            content: row.content,
            author,
            woow_count: row.woow_count,
            doow_count: row.doow_count,
            adil_count: row.adil_count,
            comment_count,
            created_at: row.created_at,
            is_event: row.is_event,
            event_at,
            is_followed: row.is_followed,
            score,
        }
    }
}

/// Identity precedence: the viewer's own live profile, then a redacted
/// placeholder for private authors, then the stored profile, then the row.
pub fn resolve_author(
    row: &CandidateRow,
    viewer_id: Uuid,
    viewer: Option<&AuthorProfile>,
    profiles: &HashMap<Uuid, AuthorProfile>,
) -> AuthorView {
    // Own posts are never redacted, even when the live lookup failed.
    if row.author_id == viewer_id {
        if let Some(own) = viewer.or_else(|| profiles.get(&viewer_id)) {
            return AuthorView::from_profile(own);
        }
    }

    match profiles.get(&row.author_id) {
        Some(profile) if profile.is_private => AuthorView::redacted(),
        Some(profile) => AuthorView::from_profile(profile),
        None => AuthorView::from_row(row),
    }
}

/// Highest score first; equal scores put the newer post first.
pub fn sort_by_score(posts: &mut [EnrichedPost]) {
    posts.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Split score-ordered posts into the personal, global and wildcard views.
///
/// Wildcards are the highest-velocity posts above the woow threshold, kept in
/// score order.
pub fn partition(
    posts: &[EnrichedPost],
    viewer_id: Uuid,
    settings: &FeedSettings,
    now: DateTime<Utc>,
) -> FeedSources {
    let personal: Vec<EnrichedPost> = posts
        .iter()
        .filter(|post| post.is_followed || post.author_id == viewer_id)
        .cloned()
        .collect();

    let global: Vec<EnrichedPost> = posts.iter().take(settings.global_limit).cloned().collect();

    let mut by_velocity: Vec<(Uuid, f64)> = posts
        .iter()
        .filter(|post| post.woow_count > settings.wildcard_min_woows)
        .map(|post| (post.id, velocity(post.woow_count, post.created_at, now)))
        .collect();
    by_velocity.sort_by(|a, b| b.1.total_cmp(&a.1));

    let picked: HashSet<Uuid> = by_velocity
        .into_iter()
        .take(settings.wildcard_limit)
        .map(|(id, _)| id)
        .collect();

    let wildcard: Vec<EnrichedPost> = posts
        .iter()
        .filter(|post| picked.contains(&post.id))
        .cloned()
        .collect();

    FeedSources {
        personal,
        global,
        wildcard,
    }
}

/// Interleave the views, or serve the global view alone when nothing personal exists.
pub fn merge_sources(sources: FeedSources, feed_limit: usize) -> Vec<EnrichedPost> {
    let FeedSources {
        personal,
        mut global,
        wildcard,
    } = sources;

    if personal.is_empty() {
        global.truncate(feed_limit);
        return global;
    }

    let mut merged = interleave(personal, global, wildcard);
    merged.truncate(feed_limit);
    merged
}
