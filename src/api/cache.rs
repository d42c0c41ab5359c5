//! In-memory response cache for GET requests with TTL masking.
//!
//! Entries are keyed by method + URL + serialized params and expire after
//! `CACHE_TTL` (5 minutes). Stale entries return `None` from `get()` but
//! remain in the map until overwritten, pattern-invalidated or cleared.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_json::{Map, Value};

/// Time-to-live for cached responses.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached response body with the headers it arrived with.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub data: Vec<u8>,
    pub headers: HashMap<String, String>,
    pub stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) <= CACHE_TTL
    }
}

/// Process-wide response cache shared by every request the client makes.
///
/// All operations are synchronous and take the lock only for their own
/// duration, so a reader never observes a half-written entry.
#[derive(Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic cache key for a request.
    ///
    /// Params are grouped by name and the names sorted, so two requests that
    /// differ only in the order of distinct names share a key. A repeated
    /// name keeps every value, in request order, as a JSON array.
    pub fn key(method: &str, url: &str, params: &[(&str, &str)]) -> String {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for &(name, value) in params {
            grouped.entry(name).or_default().push(value);
        }
        let object: Map<String, Value> = grouped
            .into_iter()
            .map(|(name, values)| {
                let value = if values.len() == 1 {
                    Value::from(values[0])
                } else {
                    Value::from(values)
                };
                (name.to_string(), value)
            })
            .collect();
        format!(
            "{}:{}:{}",
            method.to_ascii_lowercase(),
            url,
            Value::Object(object)
        )
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a cached entry if it exists and is still fresh.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.get_at(key, Instant::now())
    }

    /// Same as `get()` with an explicit notion of "now".
    pub fn get_at(&self, key: &str, now: Instant) -> Option<CacheEntry> {
        self.lock()
            .get(key)
            .filter(|entry| entry.is_fresh_at(now))
            .cloned()
    }

    /// Store a response, replacing any previous entry for the key.
    pub fn put(&self, key: &str, data: Vec<u8>, headers: HashMap<String, String>) {
        self.put_at(key, data, headers, Instant::now());
    }

    pub(crate) fn put_at(
        &self,
        key: &str,
        data: Vec<u8>,
        headers: HashMap<String, String>,
        stored_at: Instant,
    ) {
        self.lock().insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                data,
                headers,
                stored_at,
            },
        );
    }

    /// Remove every entry whose key contains `pattern`. Returns how many went.
    pub fn invalidate(&self, pattern: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("Cache invalidated {} entries matching {}", removed, pattern);
        }
        removed
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> HashMap<String, String> {
        HashMap::from([("content-type".to_string(), "application/json".to_string())])
    }

    #[test]
    fn test_key_ignores_param_order() {
        let a = ResponseCache::key("GET", "/api/paperworks/", &[("page", "2"), ("status", "open")]);
        let b = ResponseCache::key("get", "/api/paperworks/", &[("status", "open"), ("page", "2")]);
        assert_eq!(a, b);
        assert_eq!(a, r#"get:/api/paperworks/:{"page":"2","status":"open"}"#);
    }

    #[test]
    fn test_key_keeps_repeated_param_values() {
        let both = ResponseCache::key("GET", "/api/paperworks/", &[("status", "open"), ("status", "closed")]);
        let last = ResponseCache::key("GET", "/api/paperworks/", &[("status", "closed")]);
        assert_ne!(both, last);
        assert_eq!(both, r#"get:/api/paperworks/:{"status":["open","closed"]}"#);

        let reordered = ResponseCache::key(
            "GET",
            "/api/paperworks/",
            &[("page", "1"), ("status", "open"), ("status", "closed")],
        );
        let names_swapped = ResponseCache::key(
            "GET",
            "/api/paperworks/",
            &[("status", "open"), ("page", "1"), ("status", "closed")],
        );
        assert_eq!(reordered, names_swapped);
    }

    #[test]
    fn test_key_without_params() {
        assert_eq!(
            ResponseCache::key("GET", "/auth/me/", &[]),
            "get:/auth/me/:{}"
        );
    }

    #[test]
    fn test_key_differs_by_url_and_params() {
        let base = ResponseCache::key("GET", "/api/paperworks/", &[]);
        assert_ne!(base, ResponseCache::key("GET", "/api/paperworks/1/", &[]));
        assert_ne!(base, ResponseCache::key("GET", "/api/paperworks/", &[("page", "1")]));
        assert_ne!(base, ResponseCache::key("POST", "/api/paperworks/", &[]));
    }

    #[test]
    fn test_put_and_get() {
        let cache = ResponseCache::new();
        cache.put("get:/auth/me/:{}", b"{\"id\":1}".to_vec(), headers());

        let entry = cache.get("get:/auth/me/:{}").unwrap();
        assert_eq!(entry.data, b"{\"id\":1}");
        assert_eq!(entry.headers.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn test_miss() {
        let cache = ResponseCache::new();
        assert!(cache.get("get:/nothing/:{}").is_none());
    }

    #[test]
    fn test_staleness_boundary() {
        let cache = ResponseCache::new();
        let t = Instant::now();
        cache.put_at("k", vec![1], HashMap::new(), t);

        let just_fresh = t + Duration::from_secs(4 * 60 + 59);
        let just_stale = t + Duration::from_secs(5 * 60 + 1);
        assert!(cache.get_at("k", just_fresh).is_some());
        assert!(cache.get_at("k", just_stale).is_none());
    }

    #[test]
    fn test_stale_entry_is_masked_not_evicted() {
        let cache = ResponseCache::new();
        let t = Instant::now();
        cache.put_at("k", vec![1], HashMap::new(), t);

        assert!(cache.get_at("k", t + Duration::from_secs(600)).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_overwrites_and_refreshes_timestamp() {
        let cache = ResponseCache::new();
        let t = Instant::now();
        cache.put_at("k", vec![1], HashMap::new(), t);
        cache.put_at("k", vec![2], HashMap::new(), t + Duration::from_secs(400));

        let entry = cache.get_at("k", t + Duration::from_secs(500)).unwrap();
        assert_eq!(entry.data, vec![2]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_scope() {
        let cache = ResponseCache::new();
        let list = ResponseCache::key("GET", "/api/paperworks/", &[]);
        let detail = ResponseCache::key("GET", "/api/paperworks/7/", &[]);
        let users = ResponseCache::key("GET", "/admin_app/users/", &[]);
        cache.put(&list, vec![1], HashMap::new());
        cache.put(&detail, vec![2], HashMap::new());
        cache.put(&users, vec![3], HashMap::new());

        assert_eq!(cache.invalidate("/api/paperworks"), 2);
        assert!(cache.get(&list).is_none());
        assert!(cache.get(&detail).is_none());
        assert!(cache.get(&users).is_some());
    }

    #[test]
    fn test_invalidate_matches_anywhere_in_key() {
        let cache = ResponseCache::new();
        let absolute = ResponseCache::key("GET", "http://localhost:8000/api/paperworks/", &[]);
        cache.put(&absolute, vec![1], HashMap::new());
        assert_eq!(cache.invalidate("/api/paperworks"), 1);
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::new();
        cache.put("a", vec![1], HashMap::new());
        cache.put("b", vec![2], HashMap::new());
        cache.clear();
        assert!(cache.is_empty());
    }
}
