//! Concurrent TTL cache
//!
//! Keys are stable fingerprints of `{category}:{md5(sorted-json(params))}`,
//! identical for identical parameter sets regardless of insertion order.
//! Expiry is lazy: a `get` on an expired entry evicts it and reports a miss;
//! no background sweep is required. The map is sharded (dashmap), so
//! operations on disjoint keys do not contend and same-key writers leave a
//! tidy last-writer-wins state.

use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Hit/miss counters, exposed through the usage report
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
}

impl CacheStats {
    fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
        }
    }
}

pub struct TtlCache {
    entries: DashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl TtlCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Look up a key. An entry past its expiry is evicted and reported as a
    /// miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if Instant::now() < entry.expires_at {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            // Re-check under the write guard: a fresh same-key write landing
            // after the staleness check must survive the eviction
            self.entries
                .remove_if(key, |_, entry| Instant::now() >= entry.expires_at);
            tracing::debug!(key, "evicted expired cache entry");
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive the stable cache key for an operation and its parameters.
///
/// Parameters arrive in a `BTreeMap`, so serialization order is sorted and
/// independent of how the caller built the map. The format is
/// `{category}:{md5(sorted-json(params))}` and is stable across process
/// restarts for identical parameters.
pub fn cache_key(category: &str, params: &BTreeMap<String, String>) -> String {
    let serialized = serde_json::to_string(params).unwrap_or_default();
    let digest = md5::compute(serialized.as_bytes());
    format!("{category}:{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_stable_across_insertion_order() {
        let mut a = BTreeMap::new();
        a.insert("location".to_string(), "Delhi".to_string());
        a.insert("crop".to_string(), "Wheat".to_string());

        let mut b = BTreeMap::new();
        b.insert("crop".to_string(), "Wheat".to_string());
        b.insert("location".to_string(), "Delhi".to_string());

        assert_eq!(cache_key("market", &a), cache_key("market", &b));
    }

    #[test]
    fn test_key_differs_per_category_and_params() {
        let mut params = BTreeMap::new();
        params.insert("location".to_string(), "Delhi".to_string());

        let weather = cache_key("weather", &params);
        let market = cache_key("market", &params);
        assert_ne!(weather, market);
        assert!(weather.starts_with("weather:"));

        params.insert("location".to_string(), "Pune".to_string());
        assert_ne!(cache_key("weather", &params), weather);
    }

    #[test]
    fn test_get_within_ttl() {
        let cache = TtlCache::new();
        cache.set("k", json!({"temp": 31}), Duration::from_millis(500));
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(cache.get("k"), Some(json!({"temp": 31})));
    }

    #[test]
    fn test_expired_entry_is_missed_and_evicted() {
        let cache = TtlCache::new();
        cache.set("k", json!(1), Duration::from_millis(50));
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "expired entry must be evicted on read");
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = TtlCache::new();
        cache.set("a", json!(1), Duration::from_secs(60));
        cache.set("b", json!(2), Duration::from_secs(60));
        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_last_writer_wins() {
        let cache = TtlCache::new();
        cache.set("k", json!("first"), Duration::from_secs(60));
        cache.set("k", json!("second"), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!("second")));
    }

    #[test]
    fn test_concurrent_same_key_writes_do_not_corrupt_others() {
        use std::sync::Arc;

        let cache = Arc::new(TtlCache::new());
        cache.set("stable", json!("untouched"), Duration::from_secs(60));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        cache.set("contended", json!(i), Duration::from_secs(60));
                        let _ = cache.get("contended");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }

        assert_eq!(cache.get("stable"), Some(json!("untouched")));
        assert!(cache.get("contended").is_some());
    }

    #[test]
    fn test_fresh_write_survives_expired_eviction() {
        use std::sync::Arc;

        let cache = Arc::new(TtlCache::new());
        for _ in 0..50 {
            cache.set("k", json!("stale"), Duration::from_millis(1));
            std::thread::sleep(Duration::from_millis(3));

            // Reader observes the stale entry while a writer replaces it
            let writer = {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.set("k", json!("fresh"), Duration::from_secs(60));
                })
            };
            let _ = cache.get("k");
            writer.join().expect("writer thread");

            assert_eq!(cache.get("k"), Some(json!("fresh")));
        }
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let cache = TtlCache::new();
        cache.set("k", json!(1), Duration::from_secs(60));
        let _ = cache.get("k");
        let _ = cache.get("absent");
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sets, 1);
    }
}
