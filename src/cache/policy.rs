//! Read-through caching around remote fetches.
//!
//! A backend failure is never surfaced to callers: reads degrade to a miss and
//! writes are dropped, so an outage costs latency but not correctness.

use std::{fmt::Display, future::Future, sync::Arc, time::Duration};

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::backend::CacheBackend;
use super::keys::CacheKey;

pub(crate) const METRIC_CACHE_HIT: &str = "fundhub_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "fundhub_cache_miss_total";
pub(crate) const METRIC_CACHE_STALE_SERVED: &str = "fundhub_cache_stale_served_total";
pub(crate) const METRIC_CACHE_UNAVAILABLE: &str = "fundhub_cache_unavailable_total";

/// Result of reading one key.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Fresh(T),
    /// Present but past its TTL.
    Stale(T),
    Miss,
    /// The backend failed; distinct from `Miss` only for bookkeeping.
    Unavailable,
}

impl<T> CacheLookup<T> {
    /// Value regardless of freshness.
    pub fn into_value(self) -> Option<T> {
        match self {
            CacheLookup::Fresh(value) | CacheLookup::Stale(value) => Some(value),
            CacheLookup::Miss | CacheLookup::Unavailable => None,
        }
    }

    /// False only when the backend itself failed.
    pub fn backend_reachable(&self) -> bool {
        !matches!(self, CacheLookup::Unavailable)
    }
}

/// Cache-with-fallback wrapper shared by every cached resource.
///
/// Without a backend every lookup is a miss and every write a no-op.
#[derive(Clone, Default)]
pub struct CachePolicy {
    backend: Option<Arc<dyn CacheBackend>>,
}

impl std::fmt::Debug for CachePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachePolicy")
            .field("backend", &self.backend.as_ref().map(|backend| backend.name()))
            .finish()
    }
}

impl CachePolicy {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn from_backend(backend: Option<Arc<dyn CacheBackend>>) -> Self {
        Self { backend }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Read `key`, counting the outcome.
    pub async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> CacheLookup<T> {
        let lookup = self.read(key).await;
        let kind = key.kind();
        match &lookup {
            CacheLookup::Fresh(_) => counter!(METRIC_CACHE_HIT, "kind" => kind).increment(1),
            CacheLookup::Stale(_) | CacheLookup::Miss => {
                counter!(METRIC_CACHE_MISS, "kind" => kind).increment(1)
            }
            CacheLookup::Unavailable => {}
        }
        lookup
    }

    /// Write `value` under `key`. Returns whether the backend accepted it.
    pub async fn store<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };

        let rendered = key.to_string();
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(
                    target = "cache::policy::store",
                    key = %rendered,
                    error = %err,
                    "cache value could not be encoded"
                );
                return false;
            }
        };

        match backend.set(&rendered, encoded, ttl).await {
            Ok(()) => true,
            Err(err) => {
                counter!(METRIC_CACHE_UNAVAILABLE, "kind" => key.kind()).increment(1);
                warn!(
                    target = "cache::policy::store",
                    key = %rendered,
                    backend = backend.name(),
                    error = %err,
                    "cache write skipped"
                );
                false
            }
        }
    }

    /// Return the fresh cached value for `key`, or run `producer` and write
    /// its result through with `ttl`.
    ///
    /// Producer errors propagate unchanged.
    pub async fn cached<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        producer: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let lookup = self.lookup::<T>(key).await;
        let reachable = lookup.backend_reachable();
        if let CacheLookup::Fresh(value) = lookup {
            return Ok(value);
        }

        let value = producer().await?;
        if reachable {
            self.store(key, &value, ttl).await;
        }
        Ok(value)
    }

    /// Like [`CachePolicy::cached`], but never fails.
    ///
    /// The producer yields `Ok(None)` for a degraded answer (for instance a
    /// rate-limited fetch that came back empty). On a degraded answer or an
    /// error the entry under `key` is served regardless of its age; with no
    /// entry at all the result is `T::default()`.
    pub async fn cached_or_stale<T, E, F, Fut>(&self, key: &CacheKey, ttl: Duration, producer: F) -> T
    where
        T: Serialize + DeserializeOwned + Default,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let lookup = self.lookup::<T>(key).await;
        let reachable = lookup.backend_reachable();
        if let CacheLookup::Fresh(value) = lookup {
            return value;
        }

        match producer().await {
            Ok(Some(value)) => {
                if reachable {
                    self.store(key, &value, ttl).await;
                }
                return value;
            }
            Ok(None) => debug!(
                target = "cache::policy::cached_or_stale",
                key = %key,
                "producer returned a degraded result, trying stale entry"
            ),
            Err(err) => warn!(
                target = "cache::policy::cached_or_stale",
                key = %key,
                error = %err,
                "producer failed, trying stale entry"
            ),
        }

        if reachable && let Some(value) = self.read::<T>(key).await.into_value() {
            counter!(METRIC_CACHE_STALE_SERVED, "kind" => key.kind()).increment(1);
            return value;
        }
        T::default()
    }

    async fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> CacheLookup<T> {
        let Some(backend) = self.backend.as_ref() else {
            return CacheLookup::Miss;
        };

        let rendered = key.to_string();
        match backend.get(&rendered).await {
            Ok(Some(stored)) => match serde_json::from_value::<T>(stored.value) {
                Ok(value) if stored.fresh => CacheLookup::Fresh(value),
                Ok(value) => CacheLookup::Stale(value),
                Err(err) => {
                    warn!(
                        target = "cache::policy::read",
                        key = %rendered,
                        error = %err,
                        "cached value has an unexpected shape, treating as miss"
                    );
                    CacheLookup::Miss
                }
            },
            Ok(None) => CacheLookup::Miss,
            Err(err) => {
                counter!(METRIC_CACHE_UNAVAILABLE, "kind" => key.kind()).increment(1);
                warn!(
                    target = "cache::policy::read",
                    key = %rendered,
                    backend = backend.name(),
                    error = %err,
                    "cache unavailable, continuing without it"
                );
                CacheLookup::Unavailable
            }
        }
    }
}
