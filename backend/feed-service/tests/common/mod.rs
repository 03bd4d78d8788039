//! In-memory fakes for the store and cache boundaries.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use feed_service::cache::{CacheError, CacheResult, FeedCache};
use feed_service::models::{AuthorProfile, CandidateRow, VoteCounters, VoteKind};
use feed_service::store::{FeedStore, StoreError, StoreResult};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

pub fn candidate(woow: i64, doow: i64, age_hours: i64, followed: bool) -> CandidateRow {
    CandidateRow {
        id: Uuid::new_v4(),
        author_id: Uuid::new_v4(),
        content: "post body".to_string(),
        woow_count: woow,
        doow_count: doow,
        adil_count: 0,
        created_at: Some(fixed_now() - Duration::hours(age_hours)),
        is_event: false,
        event_date: None,
        is_followed: followed,
        author_name: Some("Row Author".to_string()),
        author_handle: Some("row.author".to_string()),
        author_avatar: None,
    }
}

pub fn profile(id: Uuid, name: &str, reputation: i64, is_private: bool) -> AuthorProfile {
    AuthorProfile {
        id,
        display_name: Some(name.to_string()),
        handle: Some(name.to_lowercase()),
        avatar_url: Some(format!("https://cdn.example/{}.png", name.to_lowercase())),
        reputation,
        is_private,
    }
}

/// Which store calls should fail.
#[derive(Debug, Default, Clone)]
pub struct StoreFailures {
    pub viewer_profile: bool,
    pub ranked: bool,
    pub recent: bool,
    pub comments: bool,
    pub profiles: bool,
    pub top_profile: bool,
    pub vote: bool,
}

#[derive(Default)]
pub struct FakeStore {
    pub ranked: Mutex<Vec<CandidateRow>>,
    pub recent: Mutex<Vec<CandidateRow>>,
    pub comments: Mutex<HashMap<Uuid, i64>>,
    pub profiles: Mutex<HashMap<Uuid, AuthorProfile>>,
    pub votes: Mutex<HashMap<Uuid, VoteCounters>>,
    pub failures: Mutex<StoreFailures>,
    pub ranked_calls: AtomicUsize,
    pub recent_calls: AtomicUsize,
    pub top_profile_calls: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_ranked(&self, rows: Vec<CandidateRow>) {
        *self.ranked.lock().unwrap() = rows;
    }

    pub fn set_recent(&self, rows: Vec<CandidateRow>) {
        *self.recent.lock().unwrap() = rows;
    }

    pub fn add_profile(&self, profile: AuthorProfile) {
        self.profiles.lock().unwrap().insert(profile.id, profile);
    }

    pub fn set_comments(&self, post_id: Uuid, count: i64) {
        self.comments.lock().unwrap().insert(post_id, count);
    }

    /// Register a post that can receive votes.
    pub fn add_votable_post(&self, post_id: Uuid, created_at: DateTime<Utc>) {
        self.votes.lock().unwrap().insert(
            post_id,
            VoteCounters {
                post_id,
                woow_count: 0,
                doow_count: 0,
                adil_count: 0,
                created_at: Some(created_at),
            },
        );
    }

    pub fn fail(&self, configure: impl FnOnce(&mut StoreFailures)) {
        configure(&mut self.failures.lock().unwrap());
    }

    fn failing(&self, pick: impl FnOnce(&StoreFailures) -> bool) -> StoreResult<()> {
        if pick(&self.failures.lock().unwrap()) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl FeedStore for FakeStore {
    async fn viewer_profile(&self, viewer_id: Uuid) -> StoreResult<Option<AuthorProfile>> {
        self.failing(|f| f.viewer_profile)?;
        Ok(self.profiles.lock().unwrap().get(&viewer_id).cloned())
    }

    async fn ranked_candidates(
        &self,
        _viewer_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<CandidateRow>> {
        self.ranked_calls.fetch_add(1, Ordering::SeqCst);
        self.failing(|f| f.ranked)?;
        let rows = self.ranked.lock().unwrap();
        Ok(rows.iter().take(limit as usize).cloned().collect())
    }

    async fn recent_candidates(
        &self,
        _viewer_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<CandidateRow>> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        self.failing(|f| f.recent)?;
        let rows = self.recent.lock().unwrap();
        Ok(rows.iter().take(limit as usize).cloned().collect())
    }

    async fn comment_counts(&self, post_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>> {
        self.failing(|f| f.comments)?;
        let comments = self.comments.lock().unwrap();
        Ok(post_ids
            .iter()
            .filter_map(|id| comments.get(id).map(|count| (*id, *count)))
            .collect())
    }

    async fn profiles_by_ids(
        &self,
        author_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, AuthorProfile>> {
        self.failing(|f| f.profiles)?;
        let profiles = self.profiles.lock().unwrap();
        Ok(author_ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|p| (*id, p.clone())))
            .collect())
    }

    async fn top_reputation_profile(&self) -> StoreResult<Option<AuthorProfile>> {
        self.top_profile_calls.fetch_add(1, Ordering::SeqCst);
        self.failing(|f| f.top_profile)?;
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles
            .values()
            .filter(|p| !p.is_private)
            .max_by_key(|p| p.reputation)
            .cloned())
    }

    async fn record_vote(
        &self,
        post_id: Uuid,
        _voter_id: Uuid,
        kind: VoteKind,
    ) -> StoreResult<VoteCounters> {
        self.failing(|f| f.vote)?;
        let mut votes = self.votes.lock().unwrap();
        let counters = votes
            .get_mut(&post_id)
            .ok_or_else(|| StoreError::NotFound(format!("post {}", post_id)))?;

        match kind {
            VoteKind::Woow => counters.woow_count += 1,
            VoteKind::Doow => counters.doow_count += 1,
            VoteKind::Adil => counters.adil_count += 1,
        }
        Ok(counters.clone())
    }
}

/// Sorted sets and TTL values with Redis ordering and rank semantics.
#[derive(Default)]
pub struct FakeCache {
    pub sets: Mutex<HashMap<String, Vec<(String, f64)>>>,
    pub values: Mutex<HashMap<String, (String, u64)>>,
    pub failing: AtomicBool,
    pub reads: AtomicUsize,
}

impl FakeCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn members(&self, key: &str) -> Vec<(String, f64)> {
        let mut members = self.sets.lock().unwrap().get(key).cloned().unwrap_or_default();
        sort_ascending(&mut members);
        members
    }

    pub fn score_of(&self, key: &str, member: &str) -> Option<f64> {
        self.members(key)
            .into_iter()
            .find(|(m, _)| m == member)
            .map(|(_, score)| score)
    }

    pub fn value(&self, key: &str) -> Option<(String, u64)> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn check(&self) -> CacheResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))));
        }
        Ok(())
    }
}

fn sort_ascending(members: &mut [(String, f64)]) {
    members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
}

#[async_trait]
impl FeedCache for FakeCache {
    async fn upsert_score(&self, key: &str, member: &str, score: f64) -> CacheResult<()> {
        self.check()?;
        let mut sets = self.sets.lock().unwrap();
        let set = sets.entry(key.to_string()).or_default();
        match set.iter().position(|(m, _)| m == member) {
            Some(index) => set[index].1 = score,
            None => set.push((member.to_string(), score)),
        }
        Ok(())
    }

    async fn remove_below_score(&self, key: &str, floor: f64) -> CacheResult<usize> {
        self.check()?;
        let mut sets = self.sets.lock().unwrap();
        let Some(set) = sets.get_mut(key) else {
            return Ok(0);
        };
        let before = set.len();
        set.retain(|(_, score)| *score >= floor);
        Ok(before - set.len())
    }

    async fn remove_by_rank(&self, key: &str, start: isize, stop: isize) -> CacheResult<usize> {
        self.check()?;
        let mut sets = self.sets.lock().unwrap();
        let Some(set) = sets.get_mut(key) else {
            return Ok(0);
        };
        sort_ascending(set);

        let len = set.len() as isize;
        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if start > stop || start >= len {
            return Ok(0);
        }

        let removed = set.drain(start as usize..=stop as usize).count();
        Ok(removed)
    }

    async fn top_members(&self, key: &str, limit: usize) -> CacheResult<Vec<(String, f64)>> {
        self.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut members = self.members(key);
        members.reverse();
        members.truncate(limit);
        Ok(members)
    }

    async fn get_value(&self, key: &str) -> CacheResult<Option<String>> {
        self.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.values.lock().unwrap().get(key).map(|(v, _)| v.clone()))
    }

    async fn set_value(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()> {
        self.check()?;
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl_secs));
        Ok(())
    }
}
