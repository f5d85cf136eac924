//! Collection store adapter.

use async_trait::async_trait;
use fundhub_api_types::{CollectionSchemaResponse, ItemsPage};
use reqwest::{Client, Url, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::application::sources::{CollectionSource, ListQuery, RemoteError};
use crate::config::RemoteSettings;

use super::error::InfraError;
use super::remote::{build_client, endpoint, parse_base, read_json, transport_error};

const ACCEPT_VERSION: &str = "accept-version";

pub struct WebflowCollections {
    client: Client,
    base: Url,
    token: String,
    accept_version: String,
}

impl WebflowCollections {
    pub fn new(settings: &RemoteSettings) -> Result<Self, InfraError> {
        let token = settings
            .api_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| InfraError::configuration("remote.api_token is required"))?;
        Ok(Self {
            client: build_client(settings.timeout)?,
            base: parse_base(&settings.base_url, "remote.base_url")?,
            token,
            accept_version: settings.accept_version.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        debug!(target = "infra::webflow::get_json", url = %url, "remote request");
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT_VERSION, &self.accept_version)
            .send()
            .await
            .map_err(transport_error)?;
        read_json(response).await
    }
}

#[async_trait]
impl CollectionSource for WebflowCollections {
    #[instrument(skip(self, query), fields(offset = query.offset, limit = query.limit))]
    async fn list_items(
        &self,
        collection_id: &str,
        query: &ListQuery,
    ) -> Result<ItemsPage, RemoteError> {
        let mut url = endpoint(&self.base, &["collections", collection_id, "items"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &query.limit.to_string());
            pairs.append_pair("offset", &query.offset.to_string());
            for (key, value) in &query.params {
                pairs.append_pair(key, value);
            }
        }
        self.get_json(url).await
    }

    #[instrument(skip(self))]
    async fn get_schema(
        &self,
        collection_id: &str,
    ) -> Result<CollectionSchemaResponse, RemoteError> {
        let url = endpoint(&self.base, &["collections", collection_id])?;
        self.get_json(url).await
    }
}
