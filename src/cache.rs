use bytes::Bytes;
use lru::LruCache;
use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

const PAGE_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct CachedPage {
    body: Bytes,
    expires_at: Instant,
}

/// Time-bounded cache of rendered pages keyed by query string.
///
/// Entries expire after the TTL and are never invalidated by writes, so a
/// cached page can show posts that have since been deleted. A zero TTL
/// disables caching altogether.
#[derive(Debug, Clone)]
pub struct PageCache {
    ttl: Duration,
    entries: Arc<Mutex<LruCache<String, CachedPage>>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(PAGE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        if !self.is_enabled() {
            return None;
        }
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(page) if page.expires_at > Instant::now() => Some(page.body.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, body: Bytes) {
        if !self.is_enabled() {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(
                key,
                CachedPage {
                    body,
                    expires_at: Instant::now() + self.ttl,
                },
            );
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
