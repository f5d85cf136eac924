//! Shared cache backend reached through a Redis-over-REST service.
//!
//! `GET {base}/get/{key}` answers `{"result": <json text> | null}`;
//! `POST {base}/set/{key}?EX=<secs>` stores the request body. Expired entries
//! are dropped by the service, so every hit is fresh.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheBackend, CacheError, StoredValue};
use crate::config::CacheSettings;

use super::error::InfraError;
use super::remote::{build_client, parse_base};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct KvReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct RestKvBackend {
    client: Client,
    base: Url,
    token: String,
}

impl RestKvBackend {
    pub fn new(settings: &CacheSettings) -> Result<Self, InfraError> {
        let url = settings
            .rest_url
            .as_deref()
            .ok_or_else(|| InfraError::configuration("cache.rest_url is required"))?;
        let token = settings
            .rest_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| InfraError::configuration("cache.rest_token is required"))?;
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            base: parse_base(url, "cache.rest_url")?,
            token,
        })
    }

    fn command_url(&self, command: &str, key: &str) -> Result<Url, CacheError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| CacheError::unavailable("cache.rest_url cannot be a base URL"))?
            .pop_if_empty()
            .extend([command, key]);
        Ok(url)
    }

    async fn reply(response: Response) -> Result<KvReply, CacheError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| CacheError::unavailable(err.to_string()))?;
        if !status.is_success() {
            return Err(CacheError::unavailable(format!(
                "status {status} body {}",
                String::from_utf8_lossy(&bytes)
            )));
        }
        let reply: KvReply = serde_json::from_slice(&bytes)?;
        if let Some(error) = reply.error {
            return Err(CacheError::unavailable(error));
        }
        Ok(reply)
    }
}

#[async_trait]
impl CacheBackend for RestKvBackend {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, CacheError> {
        let url = self.command_url("get", key)?;
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|err| CacheError::unavailable(err.to_string()))?;

        let value = match Self::reply(response).await?.result {
            None | Some(Value::Null) => return Ok(None),
            // Values are stored as JSON text; anything else was written by
            // another client and is passed through as-is.
            Some(Value::String(text)) => {
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            }
            Some(other) => other,
        };
        debug!(target = "infra::kv::get", key, "cache entry found");
        Ok(Some(StoredValue::fresh(value)))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let mut url = self.command_url("set", key)?;
        url.query_pairs_mut()
            .append_pair("EX", &ttl.as_secs().max(1).to_string());
        let body = serde_json::to_string(&value)?;

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .body(body)
            .send()
            .await
            .map_err(|err| CacheError::unavailable(err.to_string()))?;
        Self::reply(response).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}
