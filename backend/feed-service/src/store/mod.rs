//! Data store boundary
//!
//! The feed core only sees this trait; the relational schema and its
//! transactions live behind it.

mod postgres;

pub use postgres::PgFeedStore;

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AuthorProfile, CandidateRow, VoteCounters, VoteKind};
use crate::utils::TimedOut;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data store call timed out after {0:?}")]
    Timeout(Duration),
}

impl From<TimedOut> for StoreError {
    fn from(t: TimedOut) -> Self {
        StoreError::Timeout(t.0)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait FeedStore: Send + Sync {
    /// The viewer's own live profile.
    async fn viewer_profile(&self, viewer_id: Uuid) -> StoreResult<Option<AuthorProfile>>;

    /// Primary ranked candidate query.
    async fn ranked_candidates(&self, viewer_id: Uuid, limit: i64)
        -> StoreResult<Vec<CandidateRow>>;

    /// Reverse-chronological fallback over the most recent posts.
    async fn recent_candidates(&self, viewer_id: Uuid, limit: i64)
        -> StoreResult<Vec<CandidateRow>>;

    /// Comment counts for many posts in one round trip. Posts without comments may be absent.
    async fn comment_counts(&self, post_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>>;

    /// Profiles for many authors in one round trip.
    async fn profiles_by_ids(&self, author_ids: &[Uuid])
        -> StoreResult<HashMap<Uuid, AuthorProfile>>;

    /// Highest-reputation public profile, used as the spotlight user.
    async fn top_reputation_profile(&self) -> StoreResult<Option<AuthorProfile>>;

    /// Record a vote and return the updated authoritative counters.
    async fn record_vote(
        &self,
        post_id: Uuid,
        voter_id: Uuid,
        kind: VoteKind,
    ) -> StoreResult<VoteCounters>;
}
