//! Configuration types for caching, fetching, and the provider chain.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// TTL configuration for the content cache.
///
/// Faster-changing sources get shorter TTLs. Unlisted sources fall back
/// to `default_ttl_secs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Fallback TTL for sources without an override
    pub default_ttl_secs: u64,

    /// Per-source TTL overrides, keyed by source id
    #[serde(default)]
    pub per_source_ttl_secs: HashMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let mut per_source_ttl_secs = HashMap::new();
        // News-like sources churn fast; encyclopedic ones are stable.
        per_source_ttl_secs.insert("hackernews".to_string(), 15 * 60);
        per_source_ttl_secs.insert("wikipedia".to_string(), 24 * 60 * 60);
        per_source_ttl_secs.insert("arxiv".to_string(), 6 * 60 * 60);

        Self {
            default_ttl_secs: 60 * 60,
            per_source_ttl_secs,
        }
    }
}

impl CacheConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback TTL.
    pub fn with_default_ttl_secs(mut self, secs: u64) -> Self {
        self.default_ttl_secs = secs;
        self
    }

    /// Override the TTL for one source.
    pub fn with_source_ttl(mut self, source_id: impl Into<String>, secs: u64) -> Self {
        self.per_source_ttl_secs.insert(source_id.into(), secs);
        self
    }

    /// TTL for a source id.
    pub fn ttl_for(&self, source_id: &str) -> u64 {
        self.per_source_ttl_secs
            .get(source_id)
            .copied()
            .unwrap_or(self.default_ttl_secs)
    }
}

/// Options for a multi-source fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Maximum number of sources to query
    pub num_sources: usize,

    /// Items requested from each source
    pub items_per_source: usize,

    /// Probe and populate the cache
    pub use_cache: bool,

    /// Cap on concurrent in-flight source fetches
    pub concurrency: usize,

    /// Overall deadline for the fetch phase; in-flight calls past the
    /// deadline are abandoned and completed results are kept
    pub deadline: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            num_sources: 3,
            items_per_source: 3,
            use_cache: true,
            concurrency: 4,
            deadline: None,
        }
    }
}

impl FetchOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of sources to query.
    pub fn with_num_sources(mut self, n: usize) -> Self {
        self.num_sources = n;
        self
    }

    /// Set items per source.
    pub fn with_items_per_source(mut self, n: usize) -> Self {
        self.items_per_source = n;
        self
    }

    /// Bypass the cache for this call.
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Set the concurrency cap.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Set an overall fetch deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Configuration for the LLM provider chain.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Attempts per provider before moving to the next; the hard cap on
    /// total attempts is `providers * attempts_per_provider`
    pub attempts_per_provider: usize,

    /// Timeout for a single completion attempt
    pub attempt_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            attempts_per_provider: 2,
            attempt_timeout: Duration::from_secs(45),
        }
    }
}

impl ChainConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set attempts per provider.
    pub fn with_attempts_per_provider(mut self, n: usize) -> Self {
        self.attempts_per_provider = n.max(1);
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}
