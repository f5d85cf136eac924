//! Cache configuration.
//!
//! Picks the backend and the TTL applied to each class of cached value via
//! the `[cache]` table of `fundhub.toml`.

use std::{num::NonZeroUsize, time::Duration};

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_MEMORY_CAPACITY: usize = 1024;
const DEFAULT_COLLECTION_TTL_SECS: u64 = 259_200;
const DEFAULT_STATS_TTL_SECS: u64 = 600;

/// Where cached values are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    /// In-process LRU.
    Memory,
    /// Shared key-value service reached over HTTP.
    Rest,
    /// No cache; every read goes to the remote store.
    None,
}

impl CacheBackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheBackendKind::Memory => "memory",
            CacheBackendKind::Rest => "rest",
            CacheBackendKind::None => "none",
        }
    }
}

/// Cache configuration from `fundhub.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    /// Maximum entries held by the in-memory backend.
    pub memory_capacity: usize,
    /// TTL for collection contents, enum maps and per-project sub-resources.
    pub collection_ttl_secs: u64,
    /// TTL for the stats summary.
    pub stats_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            collection_ttl_secs: DEFAULT_COLLECTION_TTL_SECS,
            stats_ttl_secs: DEFAULT_STATS_TTL_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            memory_capacity: settings.memory_capacity.get(),
            collection_ttl_secs: settings.collection_ttl.as_secs(),
            stats_ttl_secs: settings.stats_ttl.as_secs(),
        }
    }
}

impl CacheConfig {
    /// Returns true unless the cache is switched off.
    pub fn is_enabled(&self) -> bool {
        self.backend != CacheBackendKind::None
    }

    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn collection_ttl(&self) -> Duration {
        Duration::from_secs(self.collection_ttl_secs)
    }

    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_secs)
    }
}
