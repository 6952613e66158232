//! In-memory expiring cache
//!
//! TTL-based caching for recommendation lists, with SHA256-based cache
//! key generation over serialized payloads. Expiry is checked on read
//! rather than through delayed eviction callbacks, so a stale entry can
//! never be served.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Process-wide expiring key-value cache.
pub struct ExpiringCache<V: Clone> {
    entries: DashMap<String, Entry<V>>,
}

impl<V: Clone> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<V: Clone> ExpiringCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key, dropping the entry if its TTL has elapsed.
    pub fn get(&self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => {
                debug!(key = %key, "cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
            debug!(key = %key, "cache entry expired");
        } else {
            debug!(key = %key, "cache miss");
        }
        None
    }

    pub fn insert(&self, key: String, value: V, ttl: Duration) {
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: Utc::now() + ttl,
            },
        );
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
}

/// Generate a cache key as `{prefix}:{sha256(json(payload))}`.
pub fn content_key<T: Serialize>(prefix: &str, payload: &T) -> Result<String> {
    let json = serde_json::to_string(payload).context("failed to serialize cache key payload")?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{}:{}", prefix, hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_unexpired_entries() {
        let cache = ExpiringCache::new();
        cache.insert("k".to_string(), 42u32, Duration::hours(2));
        assert_eq!(cache.get("k"), Some(42));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn expired_entries_are_dropped_on_read() {
        let cache = ExpiringCache::new();
        cache.insert("k".to_string(), 42u32, Duration::milliseconds(-1));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = ExpiringCache::new();
        cache.insert("a".to_string(), 1u32, Duration::hours(1));
        cache.insert("b".to_string(), 2u32, Duration::hours(1));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn content_key_is_deterministic_and_prefix_scoped() {
        let a = content_key("recs", &("movie", 1)).unwrap();
        let b = content_key("recs", &("movie", 1)).unwrap();
        let c = content_key("recs", &("movie", 2)).unwrap();
        let d = content_key("profile", &("movie", 1)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert!(a.starts_with("recs:"));
        assert_eq!(a.len(), "recs:".len() + 64);
    }
}
