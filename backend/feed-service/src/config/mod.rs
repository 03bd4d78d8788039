use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::jobs::cache_janitor::EvictionPolicy;
use crate::services::{FeedSettings, DEFAULT_SPOTLIGHT_TTL_SECS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub feed: FeedConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub timeout_ms: u64,
    pub spotlight_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub limit: usize,
    pub candidate_limit: i64,
    pub fallback_limit: i64,
    pub global_limit: usize,
    pub wildcard_min_woows: i64,
    pub wildcard_limit: usize,
    pub followed_relevance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Bearer token the scheduler presents to the cleanup endpoint. Empty rejects every call.
    #[serde(skip_serializing)]
    pub cron_secret: String,
    /// 0 disables the in-process janitor loop.
    pub janitor_interval_secs: u64,
    pub eviction_score_floor: f64,
    pub eviction_max_entries: usize,
}

impl Config {
    /// Load from the process environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            app: AppConfig {
                env: get("APP_ENV", "development"),
                host: get("APP_HOST", "0.0.0.0"),
                port: parse(&lookup, "APP_PORT", 8080)?,
                log_level: get("LOG_LEVEL", "info"),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
                max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
                timeout_ms: parse(&lookup, "DATABASE_TIMEOUT_MS", 2000)?,
            },
            redis: RedisConfig {
                url: get("REDIS_URL", "redis://127.0.0.1:6379"),
                timeout_ms: parse(&lookup, "REDIS_TIMEOUT_MS", 500)?,
                spotlight_ttl_secs: parse(
                    &lookup,
                    "SPOTLIGHT_TTL_SECS",
                    DEFAULT_SPOTLIGHT_TTL_SECS,
                )?,
            },
            feed: FeedConfig {
                limit: parse(&lookup, "FEED_LIMIT", 50)?,
                candidate_limit: parse(&lookup, "FEED_CANDIDATE_LIMIT", 200)?,
                fallback_limit: parse(&lookup, "FEED_FALLBACK_LIMIT", 50)?,
                global_limit: parse(&lookup, "FEED_GLOBAL_LIMIT", 50)?,
                wildcard_min_woows: parse(&lookup, "FEED_WILDCARD_MIN_WOOWS", 2)?,
                wildcard_limit: parse(&lookup, "FEED_WILDCARD_LIMIT", 10)?,
                followed_relevance: parse(&lookup, "FEED_FOLLOWED_RELEVANCE", 1.5)?,
            },
            jobs: JobsConfig {
                cron_secret: get("CRON_SECRET", ""),
                janitor_interval_secs: parse(&lookup, "CACHE_JANITOR_INTERVAL_SECS", 0)?,
                eviction_score_floor: parse(&lookup, "CACHE_EVICTION_SCORE_FLOOR", 0.1)?,
                eviction_max_entries: parse(&lookup, "CACHE_EVICTION_MAX_ENTRIES", 1000)?,
            },
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.database.timeout_ms)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.redis.timeout_ms)
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            feed_limit: self.feed.limit,
            candidate_limit: self.feed.candidate_limit,
            fallback_limit: self.feed.fallback_limit,
            global_limit: self.feed.global_limit,
            wildcard_min_woows: self.feed.wildcard_min_woows,
            wildcard_limit: self.feed.wildcard_limit,
            followed_relevance: self.feed.followed_relevance,
            store_timeout: self.store_timeout(),
        }
    }

    pub fn eviction_policy(&self) -> EvictionPolicy {
        EvictionPolicy {
            score_floor: self.jobs.eviction_score_floor,
            max_entries: self.jobs.eviction_max_entries,
            ..Default::default()
        }
    }

    pub fn janitor_interval(&self) -> Option<Duration> {
        match self.jobs.janitor_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
