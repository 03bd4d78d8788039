//! Time-decay relevance scoring
//!
//! One canonical scorer serves both consumers:
//! - `ScoringMode::Feed`: relationship-aware gravity, newborn immunity and the
//!   event-urgency override, used when assembling a viewer's feed
//! - `ScoringMode::CacheRanking`: relationship-agnostic decay used for the
//!   global ranked cache; non-positive engagement is not recommendable
//!
//! Score = net_engagement * relevance / (effective_age_hours + 2) ^ gravity

use chrono::{DateTime, Utc};

/// Smallest age used by velocity, one minute expressed in hours.
pub const VELOCITY_MIN_AGE_HOURS: f64 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    Feed,
    CacheRanking,
}

/// Time-to-event multipliers applied to event posts in feed mode.
#[derive(Debug, Clone, PartialEq)]
pub struct UrgencyPolicy {
    pub today: f64,
    pub past: f64,
    pub within_24h: f64,
    pub within_72h: f64,
    pub distant: f64,
    pub hype_woow_weight: f64,
    pub hype_comment_weight: f64,
}

impl Default for UrgencyPolicy {
    fn default() -> Self {
        Self {
            today: 5.0,
            past: 0.05,
            within_24h: 3.0,
            within_72h: 1.5,
            distant: 1.0,
            hype_woow_weight: 2.0,
            hype_comment_weight: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    pub woow_weight: f64,
    /// Negative: one doow costs 1.5x one woow.
    pub doow_weight: f64,
    /// Posts younger than this are shielded from decay.
    pub immunity_hours: f64,
    pub age_offset_hours: f64,
    pub followed_gravity: f64,
    pub default_gravity: f64,
    pub decimals: i32,
    pub urgency: UrgencyPolicy,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            woow_weight: 10.0,
            doow_weight: -15.0,
            immunity_hours: 2.0,
            age_offset_hours: 2.0,
            followed_gravity: 0.8,
            default_gravity: 1.8,
            decimals: 4,
            urgency: UrgencyPolicy::default(),
        }
    }
}

/// The inputs a score depends on, independent of where the post came from.
#[derive(Debug, Clone, Default)]
pub struct ScoreInput {
    pub woow_count: i64,
    pub doow_count: i64,
    pub comment_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub is_followed: bool,
    pub is_event: bool,
    pub event_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct Scorer {
    policy: ScoringPolicy,
}

impl Scorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Weighted net engagement before any multiplier or decay.
    pub fn base_score(&self, input: &ScoreInput) -> f64 {
        input.woow_count as f64 * self.policy.woow_weight
            + input.doow_count as f64 * self.policy.doow_weight
    }

    pub fn score(
        &self,
        input: &ScoreInput,
        relevance: f64,
        mode: ScoringMode,
        now: DateTime<Utc>,
    ) -> f64 {
        let raw = match mode {
            ScoringMode::Feed => self.feed_score(input, relevance, now),
            ScoringMode::CacheRanking => self.cache_score(input, now),
        };
        round_to(raw, self.policy.decimals)
    }

    fn feed_score(&self, input: &ScoreInput, relevance: f64, now: DateTime<Utc>) -> f64 {
        let base = self.base_score(input) * relevance;

        if input.is_event {
            let hype = input.woow_count as f64 * self.policy.urgency.hype_woow_weight
                + input.comment_count as f64 * self.policy.urgency.hype_comment_weight;
            return (base + hype) * self.urgency_multiplier(input.event_at, now);
        }

        let age = age_hours(input.created_at, now);
        let effective_age = if age < self.policy.immunity_hours {
            0.0
        } else {
            age
        };
        let gravity = if input.is_followed {
            self.policy.followed_gravity
        } else {
            self.policy.default_gravity
        };

        base / (effective_age + self.policy.age_offset_hours).powf(gravity)
    }

    fn cache_score(&self, input: &ScoreInput, now: DateTime<Utc>) -> f64 {
        let base = self.base_score(input);
        if base <= 0.0 {
            return 0.0;
        }

        let age = age_hours(input.created_at, now);
        base / (age + self.policy.age_offset_hours).powf(self.policy.default_gravity)
    }

    /// Multiplier for an event post given how far away the event is.
    pub fn urgency_multiplier(&self, event_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        let urgency = &self.policy.urgency;
        let Some(event_at) = event_at else {
            return urgency.distant;
        };

        if event_at.date_naive() == now.date_naive() {
            return urgency.today;
        }
        if event_at < now {
            return urgency.past;
        }

        let hours_until = (event_at - now).num_seconds() as f64 / 3600.0;
        if hours_until <= 24.0 {
            urgency.within_24h
        } else if hours_until <= 72.0 {
            urgency.within_72h
        } else {
            urgency.distant
        }
    }
}

/// Positive reactions per hour; brand-new posts use a one-minute floor.
pub fn velocity(woow_count: i64, created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    woow_count as f64 / age_hours(created_at, now).max(VELOCITY_MIN_AGE_HOURS)
}

/// Hours since creation, floored at zero. Unknown creation time counts as brand new.
pub fn age_hours(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match created_at {
        Some(created_at) => ((now - created_at).num_milliseconds() as f64 / 3_600_000.0).max(0.0),
        None => 0.0,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
