//! In-process cache backend.
//!
//! Entries are evicted by LRU only. An entry past its TTL stays readable as a
//! stale value until capacity pushes it out.

use std::{num::NonZeroUsize, sync::RwLock, time::Duration};

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use serde_json::Value;
use tokio::time::Instant;

use super::backend::{CacheBackend, CacheError, StoredValue};
use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";
pub(crate) const METRIC_MEMORY_EVICT: &str = "fundhub_cache_memory_evict_total";

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Value,
    expires_at: Instant,
}

/// LRU-bounded map from rendered cache key to JSON value.
pub struct MemoryCacheBackend {
    entries: RwLock<LruCache<String, MemoryEntry>>,
}

impl MemoryCacheBackend {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_capacity(config.memory_capacity_non_zero())
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, key: &str) -> Option<StoredValue> {
        let now = Instant::now();
        rw_write(&self.entries, SOURCE, "lookup")
            .get(key)
            .map(|entry| StoredValue {
                value: entry.value.clone(),
                fresh: now < entry.expires_at,
            })
    }

    pub fn insert(&self, key: &str, value: Value, ttl: Duration) {
        let entry = MemoryEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let displaced = rw_write(&self.entries, SOURCE, "insert").push(key.to_string(), entry);
        if let Some((displaced_key, _)) = displaced
            && displaced_key != key
        {
            counter!(METRIC_MEMORY_EVICT).increment(1);
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, CacheError> {
        Ok(self.lookup(key))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        self.insert(key, value, ttl);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
