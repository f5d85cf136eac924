//! Contributor directory adapter.

use async_trait::async_trait;
use fundhub_api_types::{ContributorDoc, DocsPage};
use reqwest::{Client, Url, header::AUTHORIZATION};
use tracing::instrument;

use crate::application::sources::{ContributorDirectory, RemoteError};
use crate::config::ContributorSettings;

use super::error::InfraError;
use super::remote::{build_client, endpoint, parse_base, read_json, transport_error};

pub struct PayloadDirectory {
    client: Client,
    base: Url,
    /// Sent as a bearer token when present; the directory may be public.
    token: Option<String>,
}

impl PayloadDirectory {
    pub fn new(settings: &ContributorSettings) -> Result<Self, InfraError> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            base: parse_base(&settings.base_url, "contributors.base_url")?,
            token: settings
                .api_token
                .clone()
                .filter(|token| !token.trim().is_empty()),
        })
    }
}

#[async_trait]
impl ContributorDirectory for PayloadDirectory {
    #[instrument(skip(self))]
    async fn list_contributors(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<DocsPage<ContributorDoc>, RemoteError> {
        let mut url = endpoint(&self.base, &["contributors"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = request.send().await.map_err(transport_error)?;
        read_json(response).await
    }
}
