use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use super::{FeedStore, StoreError, StoreResult};
use crate::models::{AuthorProfile, CandidateRow, VoteCounters, VoteKind};

/// How far back the primary query looks for candidates. Events are always eligible.
const CANDIDATE_WINDOW_DAYS: i32 = 14;

/// Shared projection for both candidate queries: reaction counters are
/// aggregated per post and the follow flag is resolved against the viewer ($1).
const CANDIDATE_SELECT: &str = r#"
    SELECT p.id,
           p.author_id,
           COALESCE(p.content, '') AS content,
           r.woow_count,
           r.doow_count,
           r.adil_count,
           p.created_at,
           COALESCE(p.is_event, FALSE) AS is_event,
           p.event_date,
           EXISTS (
               SELECT 1 FROM follows f
               WHERE f.follower_id = $1 AND f.following_id = p.author_id
           ) AS is_followed,
           p.author_name,
           p.author_handle,
           p.author_avatar
    FROM posts p
    LEFT JOIN LATERAL (
        SELECT COUNT(*) FILTER (WHERE kind = 'woow') AS woow_count,
               COUNT(*) FILTER (WHERE kind = 'doow') AS doow_count,
               COUNT(*) FILTER (WHERE kind = 'adil') AS adil_count
        FROM reactions
        WHERE post_id = p.id
    ) r ON TRUE
"#;

const PROFILE_SELECT: &str = r#"
    SELECT id,
           full_name AS display_name,
           username AS handle,
           avatar_url,
           COALESCE(reputation, 0)::BIGINT AS reputation,
           COALESCE(is_private, FALSE) AS is_private
    FROM profiles
"#;

/// PostgreSQL-backed feed store.
#[derive(Clone)]
pub struct PgFeedStore {
    pool: PgPool,
}

impl PgFeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedStore for PgFeedStore {
    async fn viewer_profile(&self, viewer_id: Uuid) -> StoreResult<Option<AuthorProfile>> {
        let sql = format!("{PROFILE_SELECT} WHERE id = $1");
        let profile = sqlx::query_as::<_, AuthorProfile>(&sql)
            .bind(viewer_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn ranked_candidates(
        &self,
        viewer_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<CandidateRow>> {
        let sql = format!(
            "{CANDIDATE_SELECT}
             WHERE p.created_at > NOW() - make_interval(days => $3) OR p.is_event
             ORDER BY (r.woow_count * 10 - r.doow_count * 15) DESC, p.created_at DESC
             LIMIT $2"
        );

        let rows = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(viewer_id)
            .bind(limit)
            .bind(CANDIDATE_WINDOW_DAYS)
            .fetch_all(&self.pool)
            .await?;

        debug!(viewer_id = %viewer_id, rows = rows.len(), "Ranked candidates fetched");
        Ok(rows)
    }

    async fn recent_candidates(
        &self,
        viewer_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<CandidateRow>> {
        let sql = format!("{CANDIDATE_SELECT} ORDER BY p.created_at DESC NULLS LAST LIMIT $2");

        let rows = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(viewer_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(viewer_id = %viewer_id, rows = rows.len(), "Recent candidates fetched");
        Ok(rows)
    }

    async fn comment_counts(&self, post_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT post_id, COUNT(*)::BIGINT FROM comments WHERE post_id = ANY($1) GROUP BY post_id",
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn profiles_by_ids(
        &self,
        author_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, AuthorProfile>> {
        if author_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!("{PROFILE_SELECT} WHERE id = ANY($1)");
        let profiles = sqlx::query_as::<_, AuthorProfile>(&sql)
            .bind(author_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(profiles.into_iter().map(|p| (p.id, p)).collect())
    }

    async fn top_reputation_profile(&self) -> StoreResult<Option<AuthorProfile>> {
        let sql = format!(
            "{PROFILE_SELECT}
             WHERE NOT COALESCE(is_private, FALSE)
             ORDER BY reputation DESC NULLS LAST
             LIMIT 1"
        );
        let profile = sqlx::query_as::<_, AuthorProfile>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn record_vote(
        &self,
        post_id: Uuid,
        voter_id: Uuid,
        kind: VoteKind,
    ) -> StoreResult<VoteCounters> {
        let mut tx = self.pool.begin().await?;

        // Lock the post row so concurrent votes on it serialize their counter reads.
        let created_at: Option<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT created_at FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(created_at) = created_at else {
            return Err(StoreError::NotFound(format!("post {}", post_id)));
        };

        sqlx::query(
            "INSERT INTO reactions (post_id, user_id, kind)
             VALUES ($1, $2, $3)
             ON CONFLICT (post_id, user_id) DO UPDATE SET kind = EXCLUDED.kind",
        )
        .bind(post_id)
        .bind(voter_id)
        .bind(kind.as_str())
        .execute(&mut *tx)
        .await?;

        let (woow_count, doow_count, adil_count): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE kind = 'woow'),
                    COUNT(*) FILTER (WHERE kind = 'doow'),
                    COUNT(*) FILTER (WHERE kind = 'adil')
             FROM reactions
             WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            post_id = %post_id,
            voter_id = %voter_id,
            kind = %kind,
            woow_count,
            doow_count,
            "Vote recorded"
        );

        Ok(VoteCounters {
            post_id,
            woow_count,
            doow_count,
            adil_count,
            created_at,
        })
    }
}
