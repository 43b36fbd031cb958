//! In-memory response cache for ZoomEye search results
//!
//! Provides a `ResponseCache` that keeps raw JSON responses keyed by a normalized
//! query signature. Entries expire after a fixed TTL and are removed lazily the
//! first time a lookup observes them as stale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;

/// Default time-to-live for cached responses in seconds
pub const DEFAULT_TTL_SECS: u64 = 300;

/// A cached upstream response
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The raw response payload
    data: Value,
    /// When the response was cached
    #[allow(dead_code)]
    cached_at: DateTime<Utc>,
    /// When the entry stops being served
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Snapshot of cache activity, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that returned a fresh entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries currently stored, including expired ones not yet observed
    pub entries: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Process-lifetime cache of search responses
///
/// Cloning a `ResponseCache` yields a handle to the same underlying map, so every
/// clone of a client shares one cache. There is no capacity bound: entries leave
/// the cache only through expiry, `remove` or `clear`.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    counters: Arc<Counters>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

impl ResponseCache {
    /// Creates an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            counters: Arc::new(Counters::default()),
            ttl,
        }
    }

    /// Returns the configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Reads a fresh entry from the cache
    ///
    /// Returns `None` if the key is unknown. An entry past its expiry is deleted
    /// as a side effect and also reported as `None`.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Utc::now();

        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.data.clone());
            }
        }

        // Conditional so a concurrent fresh write is never dropped here
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Inserts or overwrites an entry, expiring `ttl` from now
    pub fn set(&self, key: &str, value: Value) {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                cached_at: now,
                expires_at,
            },
        );
    }

    /// Deletes a single entry; unknown keys are ignored
    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Deletes every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included until they are observed
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Builds the signature used to deduplicate search queries
    ///
    /// The encoded query always comes first as `qbase64=<query>`. Every parameter
    /// with a value follows as `&name=value`, ordered by name. Parameters set to
    /// `None` are left out entirely, so call-site ordering never changes the key.
    ///
    /// Values are inserted verbatim. A value that itself contains `&name=` can
    /// therefore produce the same key as a different parameter set, e.g.
    /// `facets="a&fields=b"` and `facets="a", fields="b"`.
    ///
    /// # Example
    /// ```
    /// use zoomeye_query::cache::ResponseCache;
    ///
    /// let key = ResponseCache::build_key(
    ///     "dGVzdF9xdWVyeQ==",
    ///     [
    ///         ("pagesize", Some("10".to_string())),
    ///         ("fields", Some("ip,port".to_string())),
    ///         ("page", Some("1".to_string())),
    ///     ],
    /// );
    /// assert_eq!(key, "qbase64=dGVzdF9xdWVyeQ==&fields=ip,port&page=1&pagesize=10");
    /// ```
    pub fn build_key<'a, I>(qbase64: &str, params: I) -> String
    where
        I: IntoIterator<Item = (&'a str, Option<String>)>,
    {
        let mut present: Vec<(&str, String)> = params
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect();
        present.sort_by(|a, b| a.0.cmp(b.0));

        let mut key = format!("qbase64={}", qbase64);
        for (name, value) in present {
            key.push('&');
            key.push_str(name);
            key.push('=');
            key.push_str(&value);
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;
    use std::time::Duration as StdDuration;

    const QUERY: &str = "dGVzdF9xdWVyeQ==";

    fn short_lived_cache() -> ResponseCache {
        ResponseCache::new(StdDuration::from_millis(50))
    }

    #[test]
    fn test_set_then_get_returns_value() {
        let cache = ResponseCache::default();
        let value = json!({"data": "test_value"});

        cache.set("test_key", value.clone());

        assert_eq!(cache.get("test_key"), Some(value));
    }

    #[test]
    fn test_get_missing_key_returns_none() {
        let cache = ResponseCache::default();
        assert!(cache.get("nonexistent_key").is_none());
    }

    #[test]
    fn test_expired_entry_is_removed_on_read() {
        let cache = short_lived_cache();
        cache.set("test_key", json!({"data": "test_value"}));
        assert_eq!(cache.len(), 1);

        thread::sleep(StdDuration::from_millis(120));

        assert!(cache.get("test_key").is_none(), "Expired entry should not be served");
        assert_eq!(cache.len(), 0, "Expired entry should be deleted by the read");
    }

    #[test]
    fn test_expired_entry_stays_until_observed() {
        let cache = short_lived_cache();
        cache.set("a", json!(1));
        cache.set("b", json!(2));

        thread::sleep(StdDuration::from_millis(120));

        assert!(cache.get("a").is_none());
        assert_eq!(cache.len(), 1, "Only the observed entry is removed");
    }

    #[test]
    fn test_set_overwrites_and_refreshes_expiry() {
        let cache = ResponseCache::new(StdDuration::from_millis(200));
        cache.set("key", json!("first"));
        thread::sleep(StdDuration::from_millis(120));
        cache.set("key", json!("second"));
        thread::sleep(StdDuration::from_millis(120));

        assert_eq!(cache.get("key"), Some(json!("second")));
    }

    #[test]
    fn test_remove_deletes_entry() {
        let cache = ResponseCache::default();
        cache.set("test_key", json!({"data": "test_value"}));

        cache.remove("test_key");

        assert!(cache.get("test_key").is_none());
    }

    #[test]
    fn test_remove_unknown_key_is_noop() {
        let cache = ResponseCache::default();
        cache.set("kept", json!(true));

        cache.remove("missing");

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = ResponseCache::default();
        cache.set("test_key", json!({"data": "test_value"}));
        cache.set("another_key", json!({"data": "another_value"}));

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get("test_key").is_none());
        assert!(cache.get("another_key").is_none());
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = ResponseCache::default();
        let handle = cache.clone();

        handle.set("shared", json!([1, 2, 3]));

        assert_eq!(cache.get("shared"), Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_stats_count_hits_and_misses() {
        let cache = ResponseCache::default();
        cache.set("key", json!(1));

        cache.get("key");
        cache.get("key");
        cache.get("other");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_build_key_matches_expected_format() {
        let key = ResponseCache::build_key(
            QUERY,
            [
                ("page", Some("1".to_string())),
                ("pagesize", Some("10".to_string())),
                ("fields", Some("ip,port".to_string())),
            ],
        );
        assert_eq!(key, "qbase64=dGVzdF9xdWVyeQ==&fields=ip,port&page=1&pagesize=10");
    }

    #[test]
    fn test_build_key_omits_absent_params() {
        let key = ResponseCache::build_key(
            QUERY,
            [
                ("page", Some("1".to_string())),
                ("pagesize", Some("10".to_string())),
                ("fields", None),
            ],
        );
        assert_eq!(key, "qbase64=dGVzdF9xdWVyeQ==&page=1&pagesize=10");
    }

    #[test]
    fn test_build_key_ignores_param_order() {
        let forward = ResponseCache::build_key(
            QUERY,
            [
                ("facets", Some("country".to_string())),
                ("sub_type", Some("v4".to_string())),
                ("page", Some("2".to_string())),
            ],
        );
        let reversed = ResponseCache::build_key(
            QUERY,
            [
                ("page", Some("2".to_string())),
                ("sub_type", Some("v4".to_string())),
                ("facets", Some("country".to_string())),
            ],
        );
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_build_key_distinguishes_values() {
        let page_one = ResponseCache::build_key(QUERY, [("page", Some("1".to_string()))]);
        let page_two = ResponseCache::build_key(QUERY, [("page", Some("2".to_string()))]);
        let other_query = ResponseCache::build_key("b3RoZXI=", [("page", Some("1".to_string()))]);

        assert_ne!(page_one, page_two);
        assert_ne!(page_one, other_query);
    }

    #[test]
    fn test_build_key_inserts_values_verbatim() {
        let embedded = ResponseCache::build_key(QUERY, [("facets", Some("a&fields=b".to_string()))]);
        let split = ResponseCache::build_key(
            QUERY,
            [
                ("facets", Some("a".to_string())),
                ("fields", Some("b".to_string())),
            ],
        );

        assert_eq!(embedded, "qbase64=dGVzdF9xdWVyeQ==&facets=a&fields=b");
        assert_eq!(embedded, split, "Values are not escaped");
    }

    #[test]
    fn test_build_key_without_params_is_query_only() {
        let key = ResponseCache::build_key(QUERY, std::iter::empty());
        assert_eq!(key, "qbase64=dGVzdF9xdWVyeQ==");
    }
}
