use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Context lookups keyed by normalized query, so repeated analyses of the
/// same event do not hit the search backend again.
pub struct ContextCache {
    cache: DashMap<String, CachedContext>,
    ttl: Duration,
}

struct CachedContext {
    text: String,
    timestamp: Instant,
}

impl ContextCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: DashMap::new(),
            ttl,
        }
    }

    pub fn insert(&self, query: &str, text: String) {
        self.cache.insert(
            cache_key(query),
            CachedContext {
                text,
                timestamp: Instant::now(),
            },
        );
    }

    /// Get context if not expired (evict on read)
    pub fn get(&self, query: &str) -> Option<String> {
        let key = cache_key(query);
        let expired = match self.cache.get(&key) {
            Some(entry) if entry.timestamp.elapsed() <= self.ttl => {
                return Some(entry.text.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.cache.remove(&key);
        }
        None
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn cache_key(query: &str) -> String {
    query.trim().to_lowercase()
}
