//! Fundhub cache system
//!
//! Every remote read goes through a [`CachePolicy`], which talks to one
//! [`CacheBackend`]:
//!
//! - **memory**: an in-process LRU ([`MemoryCacheBackend`])
//! - **rest**: a shared key-value service (see `infra::kv`)
//! - **none**: caching switched off
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "memory"
//! memory_capacity = 1024
//! collection_ttl_secs = 259200
//! # ... see config.rs for all options
//! ```

mod backend;
mod config;
mod keys;
mod lock;
mod policy;
mod store;

pub use backend::{CacheBackend, CacheError, StoredValue};
pub use config::{CacheBackendKind, CacheConfig};
pub use keys::CacheKey;
pub use policy::{CacheLookup, CachePolicy};
pub use store::MemoryCacheBackend;

pub(crate) use policy::{
    METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_STALE_SERVED, METRIC_CACHE_UNAVAILABLE,
};
pub(crate) use store::METRIC_MEMORY_EVICT;
