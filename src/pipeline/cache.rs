//! Generation cache
//!
//! Time-bounded memoization of generated artifacts. Expired entries are
//! inert even before they are physically removed; lookup removes them on
//! access. Inserts past the capacity ceiling evict the oldest entries in
//! bulk down to a watermark, amortizing eviction cost.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One memoized artifact
#[derive(Debug, Clone)]
struct CacheEntry {
    content: String,
    backend: String,
    inserted_at: Instant,
}

/// A cache hit: the content plus the backend that originally produced it
#[derive(Debug, Clone)]
pub struct CachedArtifact {
    pub content: String,
    pub backend: String,
}

/// Bounded, TTL-expiring cache of generated artifacts
pub struct GenerationCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
    watermark: usize,
}

impl GenerationCache {
    /// Create a cache with the given TTL, capacity ceiling, and eviction
    /// watermark
    pub fn new(ttl: Duration, capacity: usize, watermark: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
            watermark: watermark.min(capacity),
        }
    }

    /// Look up a live entry. Expired entries are removed and treated as
    /// absent.
    pub fn get(&self, key: &str) -> Option<CachedArtifact> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => Some(CachedArtifact {
                content: entry.content.clone(),
                backend: entry.backend.clone(),
            }),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store an artifact, replacing any previous entry wholesale. Triggers
    /// bulk eviction when the capacity ceiling is exceeded.
    pub fn put(&self, key: &str, content: &str, backend: &str) {
        let mut entries = self.lock();
        entries.insert(
            key.to_string(),
            CacheEntry {
                content: content.to_string(),
                backend: backend.to_string(),
                inserted_at: Instant::now(),
            },
        );

        if entries.len() > self.capacity {
            let evict_count = entries.len() - self.watermark;
            let mut by_age: Vec<(String, Instant)> = entries
                .iter()
                .map(|(k, e)| (k.clone(), e.inserted_at))
                .collect();
            by_age.sort_by_key(|(_, inserted_at)| *inserted_at);

            for (key, _) in by_age.into_iter().take(evict_count) {
                entries.remove(&key);
            }
            tracing::debug!(evicted = evict_count, "Cache capacity eviction");
        }
    }

    /// Current number of physically present entries (live or expired)
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let cache = GenerationCache::new(Duration::from_secs(60), 10, 8);
        assert!(cache.get("k1").is_none());

        cache.put("k1", "generated text", "openai-gpt4");
        let hit = cache.get("k1").unwrap();
        assert_eq!(hit.content, "generated text");
        assert_eq!(hit.backend, "openai-gpt4");
    }

    #[test]
    fn test_expired_entry_is_absent_and_removed() {
        let cache = GenerationCache::new(Duration::from_millis(0), 10, 8);
        cache.put("k1", "stale", "openai-gpt4");
        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get("k1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_replacement_is_wholesale() {
        let cache = GenerationCache::new(Duration::from_secs(60), 10, 8);
        cache.put("k1", "first", "openai-gpt4");
        cache.put("k1", "second", "groq-llama3");

        let hit = cache.get("k1").unwrap();
        assert_eq!(hit.content, "second");
        assert_eq!(hit.backend, "groq-llama3");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_bulk_eviction_to_watermark() {
        let cache = GenerationCache::new(Duration::from_secs(60), 5, 3);
        for i in 0..6 {
            cache.put(&format!("k{i}"), "content", "expert-template");
            // Distinct insertion instants keep age ordering unambiguous
            std::thread::sleep(Duration::from_millis(2));
        }

        assert_eq!(cache.len(), 3);
        // The newest entries survive
        assert!(cache.get("k5").is_some());
        assert!(cache.get("k4").is_some());
        assert!(cache.get("k0").is_none());
        assert!(cache.get("k1").is_none());
    }
}
