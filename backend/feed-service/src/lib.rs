pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use cache::{CacheError, CacheKey, FeedCache, RedisFeedCache};
pub use config::Config;
pub use error::{AppError, Result};
pub use jobs::cache_janitor::{CacheJanitor, EvictionPolicy, EvictionReport};
pub use services::{
    interleave, FeedAssembler, FeedSettings, ScoringMode, ScoringPolicy, SpotlightService,
    VoteService,
};
pub use store::{FeedStore, PgFeedStore, StoreError};
pub use utils::{Clock, FixedClock, SystemClock};
