use cogent_core::{CogentResult, GeneratedContent};
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    data: GeneratedContent,
    inserted: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted) >= self.ttl
    }
}

/// TTL-keyed memoization of generation results.
///
/// Keys are derived before provider selection, so a hit never depends on
/// which provider would have served the request. Expired entries are evicted
/// lazily on read; there is no background sweep.
pub struct CacheStore {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl CacheStore {
    /// Creates a store with the given default time-to-live.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Derives a provider-agnostic cache key: the hex SHA-256 of the function
    /// kind and the serialized request parameters.
    ///
    /// Serialization failure here is a configuration bug (a request type that
    /// cannot round-trip), not a retryable condition.
    pub fn key<T: Serialize>(kind: &str, request: &T) -> CogentResult<String> {
        let serialized = serde_json::to_string(request)?;
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        hasher.update(b"\0");
        hasher.update(serialized.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Returns the cached value for `key` if present and not expired.
    /// An expired entry is removed on the way out.
    pub fn get(&self, key: &str) -> Option<GeneratedContent> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.data.clone()),
            None => None,
        }
    }

    /// Stores `data` under `key`, with an optional per-entry TTL override.
    pub fn insert(&self, key: String, data: GeneratedContent, ttl: Option<Duration>) {
        let mut entries = self.entries.lock();
        entries.insert(
            key,
            CacheEntry {
                data,
                inserted: Instant::now(),
                ttl: ttl.unwrap_or(self.default_ttl),
            },
        );
    }

    /// Drops every entry unconditionally.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cogent_core::{ContentOptions, GenerationRequest};

    fn content(text: &str) -> GeneratedContent {
        GeneratedContent {
            content: text.into(),
            confidence: 0.9,
            provider: "openai".into(),
            model: "gpt-4".into(),
            tokens_used: 10,
            cost: 0.0003,
            cached: false,
        }
    }

    #[test]
    fn key_is_stable_for_identical_requests() {
        let a = GenerationRequest::new("hello").with_system_prompt("sys");
        let b = GenerationRequest::new("hello").with_system_prompt("sys");
        assert_eq!(
            CacheStore::key("generate", &a).unwrap(),
            CacheStore::key("generate", &b).unwrap()
        );
    }

    #[test]
    fn key_differs_when_options_differ() {
        let a = GenerationRequest::new("hello");
        let b = GenerationRequest::new("hello").with_options(ContentOptions {
            tone: Some("formal".into()),
            ..ContentOptions::default()
        });
        assert_ne!(
            CacheStore::key("generate", &a).unwrap(),
            CacheStore::key("generate", &b).unwrap()
        );
    }

    #[test]
    fn key_differs_across_function_kinds() {
        let req = GenerationRequest::new("hello");
        assert_ne!(
            CacheStore::key("generate", &req).unwrap(),
            CacheStore::key("generate_image", &req).unwrap()
        );
    }

    #[test]
    fn get_returns_stored_value_within_ttl() {
        let cache = CacheStore::new(Duration::from_secs(60));
        cache.insert("k".into(), content("cached"), None);

        let hit = cache.get("k").unwrap();
        assert_eq!(hit.content, "cached");
    }

    #[test]
    fn expired_entries_are_evicted_on_read() {
        let cache = CacheStore::new(Duration::from_millis(10));
        cache.insert("k".into(), content("stale"), None);

        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.get("k").is_none());
        // Lazy eviction removed the entry.
        assert!(cache.is_empty());
    }

    #[test]
    fn per_entry_ttl_overrides_default() {
        let cache = CacheStore::new(Duration::from_millis(10));
        cache.insert(
            "long".into(),
            content("fresh"),
            Some(Duration::from_secs(60)),
        );

        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.get("long").is_some());
    }

    #[test]
    fn clear_drops_everything() {
        let cache = CacheStore::new(Duration::from_secs(60));
        cache.insert("a".into(), content("a"), None);
        cache.insert("b".into(), content("b"), None);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
