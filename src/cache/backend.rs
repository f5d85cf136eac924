//! Storage port for cached values.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached or refused the request.
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache value could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// A value read back from a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub value: Value,
    /// False once the entry has outlived its TTL.
    pub fresh: bool,
}

impl StoredValue {
    pub fn fresh(value: Value) -> Self {
        Self { value, fresh: true }
    }

    pub fn stale(value: Value) -> Self {
        Self {
            value,
            fresh: false,
        }
    }
}

/// Key-value storage with per-entry TTLs.
///
/// Backends that can keep entries past their TTL return them with
/// `fresh == false`; backends that drop expired entries return `Ok(None)`.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, CacheError>;

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;

    /// Name reported in logs.
    fn name(&self) -> &'static str;
}
