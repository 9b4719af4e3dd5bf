//! TTL cache shared by the orchestrator and selector.
//!
//! Entries are idempotent recomputations of the same query, so
//! last-writer-wins under concurrent access is acceptable. Expired
//! entries are treated as absent and lazily evicted on lookup, with a
//! `sweep` available for periodic purging.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;

/// A cached value with its creation time and TTL.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: DateTime<Utc>,
    ttl_secs: u64,
}

impl<V> CacheEntry<V> {
    /// Valid iff `now < created_at + ttl`.
    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.created_at + ChronoDuration::seconds(self.ttl_secs as i64)
    }
}

/// In-memory key-value cache with per-entry TTL.
///
/// Safe for concurrent access from multiple in-flight fetches; a single
/// entry is read or replaced atomically under the lock.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a key. Expired entries are evicted and reported absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Utc::now();
        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if entry.is_valid_at(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Lazy eviction of the expired entry.
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get(key) {
            if !entry.is_valid_at(now) {
                entries.remove(key);
            }
        }
        None
    }

    /// Store a value with a TTL in seconds. Last writer wins.
    pub fn set(&self, key: impl Into<String>, value: V, ttl_secs: u64) {
        self.entries.write().unwrap().insert(
            key.into(),
            CacheEntry {
                value,
                created_at: Utc::now(),
                ttl_secs,
            },
        );
    }

    /// Remove a key explicitly.
    pub fn invalidate(&self, key: &str) {
        self.entries.write().unwrap().remove(key);
    }

    /// Purge all expired entries, returning how many were evicted.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, e| e.is_valid_at(now));
        before - entries.len()
    }

    /// Number of entries currently held (including not-yet-swept expired ones).
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    #[cfg(test)]
    fn set_with_created_at(
        &self,
        key: impl Into<String>,
        value: V,
        ttl_secs: u64,
        created_at: DateTime<Utc>,
    ) {
        self.entries.write().unwrap().insert(
            key.into(),
            CacheEntry {
                value,
                created_at,
                ttl_secs,
            },
        );
    }
}

/// Deterministic cache key for an operation and its parameters.
///
/// Identical `(operation, parts)` always fingerprint to the same key, so
/// repeated requests within the TTL window never re-hit the network.
pub fn fingerprint(operation: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    for part in parts {
        hasher.update([0u8]);
        hasher.update(part.as_bytes());
    }
    format!("{}:{:x}", operation, hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_roundtrip() {
        let cache: TtlCache<Vec<String>> = TtlCache::new();
        cache.set("k", vec!["v".to_string()], 60);
        assert_eq!(cache.get("k"), Some(vec!["v".to_string()]));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_expired_entry_is_absent_and_evicted() {
        let cache: TtlCache<u32> = TtlCache::new();
        let past = Utc::now() - ChronoDuration::seconds(10);
        cache.set_with_created_at("k", 1, 5, past);

        assert_eq!(cache.get("k"), None);
        // Lazy eviction removed it.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_valid_just_before_expiry() {
        let cache: TtlCache<u32> = TtlCache::new();
        let past = Utc::now() - ChronoDuration::seconds(4);
        cache.set_with_created_at("k", 1, 5, past);
        assert_eq!(cache.get("k"), Some(1));
    }

    #[test]
    fn test_invalidate() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.set("k", 1, 60);
        cache.invalidate("k");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_sweep_purges_only_expired() {
        let cache: TtlCache<u32> = TtlCache::new();
        let past = Utc::now() - ChronoDuration::seconds(10);
        cache.set_with_created_at("old", 1, 5, past);
        cache.set("fresh", 2, 60);

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some(2));
    }

    #[test]
    fn test_last_writer_wins() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.set("k", 1, 60);
        cache.set("k", 2, 60);
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_fingerprint_deterministic_and_distinct() {
        let a = fingerprint("fetch", &["wikipedia", "quantum computing", "3"]);
        let b = fingerprint("fetch", &["wikipedia", "quantum computing", "3"]);
        let c = fingerprint("fetch", &["arxiv", "quantum computing", "3"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        // Parameter boundaries matter: ("ab","c") != ("a","bc")
        let d = fingerprint("op", &["ab", "c"]);
        let e = fingerprint("op", &["a", "bc"]);
        assert_ne!(d, e);
    }
}
