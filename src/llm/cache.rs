//! Short-lived cache of model responses
//!
//! Entries are keyed by the uploaded file's fingerprint, the action and the
//! request text, so repeating an identical action within a session does not
//! pay for a second model call. Expiry is checked lazily on read.

use log::debug;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    inserted_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    enabled: bool,
    hits: usize,
    misses: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    pub ttl_secs: u64,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            enabled: true,
            hits: 0,
            misses: 0,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Duration::ZERO)
        }
    }

    pub fn get(&mut self, key: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let expired = match self.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                self.hits += 1;
                debug!("Response cache hit");
                return Some(entry.text.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        self.misses += 1;
        None
    }

    pub fn insert(&mut self, key: String, text: String) {
        if !self.enabled {
            return;
        }
        self.entries.insert(
            key,
            CacheEntry {
                text,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drops expired entries, returning how many were removed
    pub fn purge_expired(&mut self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

/// Key over the upload fingerprint, the action name and the request text
pub fn cache_key(fingerprint: &str, action: &str, request_text: &str) -> String {
    let mut hasher = Sha256::new();
    for field in [fingerprint, action, request_text] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_after_insert() {
        let mut cache = ResponseCache::new(Duration::from_secs(60));
        let key = cache_key("abc", "review", "job");

        assert_eq!(cache.get(&key), None);
        cache.insert(key.clone(), "Looks good".to_string());
        assert_eq!(cache.get(&key), Some("Looks good".to_string()));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn test_expired_entries_are_evicted_on_read() {
        let mut cache = ResponseCache::new(Duration::ZERO);
        cache.insert("k".to_string(), "v".to_string());

        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let mut cache = ResponseCache::new(Duration::ZERO);
        cache.insert("a".to_string(), "1".to_string());
        cache.insert("b".to_string(), "2".to_string());

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_disabled_cache_never_stores() {
        let mut cache = ResponseCache::disabled();
        cache.insert("k".to_string(), "v".to_string());
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_depends_on_every_component() {
        let base = cache_key("file", "review", "job");
        assert_eq!(base, cache_key("file", "review", "job"));
        assert_ne!(base, cache_key("other", "review", "job"));
        assert_ne!(base, cache_key("file", "match", "job"));
        assert_ne!(base, cache_key("file", "review", "job2"));
        // Field boundaries are length-prefixed
        assert_ne!(cache_key("ab", "c", ""), cache_key("a", "bc", ""));
    }
}
