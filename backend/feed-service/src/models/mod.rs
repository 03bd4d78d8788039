use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used when an author has marked their profile private.
pub const PRIVATE_MEMBER_NAME: &str = "Private member";

/// Display name used when neither a profile nor denormalized row fields exist.
pub const UNKNOWN_MEMBER_NAME: &str = "Member";

/// Raw candidate row as returned by the data store, before enrichment.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub woow_count: i64,
    pub doow_count: i64,
    pub adil_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub is_event: bool,
    /// Free-form event date as stored by the client; parsed leniently.
    pub event_date: Option<String>,
    pub is_followed: bool,
    pub author_name: Option<String>,
    pub author_handle: Option<String>,
    pub author_avatar: Option<String>,
}

impl CandidateRow {
    /// Parsed event instant, `None` when the post is not an event or the date is unusable.
    pub fn event_at(&self) -> Option<DateTime<Utc>> {
        if !self.is_event {
            return None;
        }
        self.event_date.as_deref().and_then(parse_event_time)
    }
}

/// Author profile snapshot from the profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuthorProfile {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub handle: Option<String>,
    pub avatar_url: Option<String>,
    pub reputation: i64,
    pub is_private: bool,
}

/// Author identity as shown next to a post, after privacy resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub display_name: String,
    pub handle: Option<String>,
    pub avatar_url: Option<String>,
    pub reputation: i64,
    pub is_private: bool,
}

impl AuthorView {
    pub fn redacted() -> Self {
        Self {
            display_name: PRIVATE_MEMBER_NAME.to_string(),
            handle: None,
            avatar_url: None,
            reputation: 0,
            is_private: true,
        }
    }

    pub fn from_profile(profile: &AuthorProfile) -> Self {
        let display_name = profile
            .display_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| profile.handle.clone())
            .unwrap_or_else(|| UNKNOWN_MEMBER_NAME.to_string());

        Self {
            display_name,
            handle: profile.handle.clone(),
            avatar_url: profile.avatar_url.clone(),
            reputation: profile.reputation,
            is_private: profile.is_private,
        }
    }

    /// Last resort: whatever author fields were denormalized onto the row.
    pub fn from_row(row: &CandidateRow) -> Self {
        Self {
            display_name: row
                .author_name
                .clone()
                .or_else(|| row.author_handle.clone())
                .unwrap_or_else(|| UNKNOWN_MEMBER_NAME.to_string()),
            handle: row.author_handle.clone(),
            avatar_url: row.author_avatar.clone(),
            reputation: 0,
            is_private: false,
        }
    }
}

/// A scored, enriched post as returned in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub author: AuthorView,
    pub woow_count: i64,
    pub doow_count: i64,
    pub adil_count: i64,
    pub comment_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub is_event: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_at: Option<DateTime<Utc>>,
    pub is_followed: bool,
    pub score: f64,
}

/// Feed response: merged posts plus the independently cached spotlight user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub posts: Vec<EnrichedPost>,
    pub spotlight: Option<AuthorProfile>,
}

/// Reaction types a member can cast on a post or answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    /// Positive reaction.
    Woow,
    /// Negative reaction.
    Doow,
    /// Neutral "fairness" reaction.
    Adil,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Woow => "woow",
            Self::Doow => "doow",
            Self::Adil => "adil",
        }
    }
}

impl std::fmt::Display for VoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authoritative counters returned by the store after a vote write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VoteCounters {
    pub post_id: Uuid,
    pub woow_count: i64,
    pub doow_count: i64,
    pub adil_count: i64,
    pub created_at: Option<DateTime<Utc>>,
}

/// One member of the global ranked cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub post_id: String,
    pub score: f64,
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) and bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_supported_event_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 5, 1, 18, 30, 0).unwrap();
        assert_eq!(parse_event_time("2026-05-01T18:30:00Z"), Some(expected));
        assert_eq!(parse_event_time("2026-05-01T20:30:00+02:00"), Some(expected));
        assert_eq!(parse_event_time("2026-05-01 18:30:00"), Some(expected));
        assert_eq!(
            parse_event_time("2026-05-01"),
            Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn malformed_event_dates_are_ignored() {
        assert_eq!(parse_event_time(""), None);
        assert_eq!(parse_event_time("next tuesday"), None);
        assert_eq!(parse_event_time("2026-13-45"), None);
    }

    #[test]
    fn profile_view_prefers_display_name_then_handle() {
        let profile = AuthorProfile {
            id: Uuid::new_v4(),
            display_name: Some("  ".to_string()),
            handle: Some("av.deniz".to_string()),
            avatar_url: None,
            reputation: 40,
            is_private: false,
        };
        assert_eq!(AuthorView::from_profile(&profile).display_name, "av.deniz");
    }

    #[test]
    fn vote_kind_uses_lowercase_wire_names() {
        let kind: VoteKind = serde_json::from_str("\"doow\"").unwrap();
        assert_eq!(kind, VoteKind::Doow);
        assert_eq!(serde_json::to_string(&VoteKind::Adil).unwrap(), "\"adil\"");
    }
}
