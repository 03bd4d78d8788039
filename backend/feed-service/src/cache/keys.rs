//! Cache key schema
//!
//! Key format: v{VERSION}:{entity}:{identifier}

/// Bump when a stored value changes shape.
pub const CACHE_VERSION: u32 = 1;

pub struct CacheKey;

impl CacheKey {
    /// Relationship-agnostic ranked feed shared by every viewer.
    /// Format: v1:feed:global
    pub fn global_feed() -> String {
        format!("v{}:feed:global", CACHE_VERSION)
    }

    /// Featured user shown beside the feed.
    /// Format: v1:spotlight:user
    pub fn spotlight_user() -> String {
        format!("v{}:spotlight:user", CACHE_VERSION)
    }
}
