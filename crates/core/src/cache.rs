//! Ephemeral key/value cache with per-entry TTL.
//!
//! Values are stored as JSON so any serializable result can be memoized.
//! A miss is `None`.

use std::time::{Duration, Instant};

use moka::Expiry;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Cache backend used by the managers.
pub trait Cache: Send + Sync {
    /// Value stored under `key`, or `None` when absent or expired.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key` for `ttl`.
    fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Evict `key`. Returns whether an entry was present.
    fn delete(&self, key: &str) -> bool;
}

/// Read a typed value. Entries that no longer deserialize count as a miss.
pub fn fetch<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    let value = cache.get(key)?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(key, error = %e, "Discarding undecodable cache entry");
            None
        }
    }
}

/// Write a typed value.
pub fn store<T: Serialize>(cache: &dyn Cache, key: &str, value: &T, ttl: Duration) {
    match serde_json::to_value(value) {
        Ok(v) => cache.set(key, v, ttl),
        Err(e) => tracing::warn!(key, error = %e, "Failed to encode cache entry"),
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    ttl: Duration,
    expires_at: Instant,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Default bound on stored entries.
pub const DEFAULT_CAPACITY: u64 = 100_000;

/// Process-local cache backed by moka. Expired entries are evicted during
/// its housekeeping, and the entry count is bounded.
pub struct MemoryCache {
    entries: moka::sync::Cache<String, CacheEntry>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        Self {
            entries: moka::sync::Cache::builder()
                .max_capacity(max_entries)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let entry = self.entries.get(key)?;
        entry.expires_at.checked_duration_since(Instant::now())
    }

    /// Number of stored entries after pending evictions have run.
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value)
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                ttl,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_miss() {
        let cache = MemoryCache::new();
        assert!(cache.get("nothing").is_none());
    }

    #[test]
    fn test_set_then_get() {
        let cache = MemoryCache::new();
        cache.set("k", json!({"a": 1}), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_entry_expires() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_expired_entries_are_evicted_without_reads() {
        let cache = MemoryCache::new();
        for i in 0..200 {
            cache.set(&format!("stem_{}", i), json!(i), Duration::from_millis(50));
        }
        assert_eq!(cache.len(), 200);
        // Expiry is processed on a timer wheel with roughly one second ticks.
        std::thread::sleep(Duration::from_millis(1500));
        cache.set("fresh", json!("kept"), Duration::from_secs(60));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some(json!("kept")));
    }

    #[test]
    fn test_entry_count_is_bounded() {
        let cache = MemoryCache::with_capacity(10);
        for i in 0..100 {
            cache.set(&format!("k{}", i), json!(i), Duration::from_secs(60));
        }
        assert!(cache.len() <= 10);
    }

    #[test]
    fn test_overwrite_takes_new_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), Duration::from_secs(100));
        cache.set("k", json!(2), Duration::from_secs(10));
        assert_eq!(cache.get("k"), Some(json!(2)));
        assert!(cache.ttl_remaining("k").unwrap() <= Duration::from_secs(10));
    }

    #[test]
    fn test_delete() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), Duration::from_secs(60));
        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_ttl_remaining() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), Duration::from_secs(100));
        let left = cache.ttl_remaining("k").unwrap();
        assert!(left > Duration::from_secs(95));
        assert!(left <= Duration::from_secs(100));
        assert!(cache.ttl_remaining("other").is_none());
    }

    #[test]
    fn test_typed_round_trip_and_bad_shape() {
        let cache = MemoryCache::new();
        store(&cache, "pairs", &vec![(1u32, "one".to_string())], Duration::from_secs(5));
        let pairs: Vec<(u32, String)> = fetch(&cache, "pairs").unwrap();
        assert_eq!(pairs, vec![(1, "one".to_string())]);

        cache.set("pairs", json!("not a list"), Duration::from_secs(5));
        assert!(fetch::<Vec<(u32, String)>>(&cache, "pairs").is_none());
    }
}
