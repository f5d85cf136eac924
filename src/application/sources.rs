//! Source traits describing remote adapters.

use std::collections::BTreeSet;

use async_trait::async_trait;
use fundhub_api_types::{CollectionSchemaResponse, ContributorDoc, DocsPage, ItemsPage};
use thiserror::Error;

use crate::domain::entities::{Contributor, DonationTotals};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote answered 429.
    #[error("remote store rate limited the request")]
    RateLimited,
    #[error("remote store unavailable{}: {message}", status_suffix(.status))]
    Unavailable {
        status: Option<u16>,
        message: String,
    },
    #[error("failed to decode remote response: {0}")]
    Decode(String),
    #[error("remote source misconfigured: {0}")]
    Configuration(String),
}

impl RemoteError {
    pub fn unavailable(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            status,
            message: message.into(),
        }
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RemoteError::RateLimited)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" (status {code})"))
        .unwrap_or_default()
}

/// One page request against a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: u32,
    pub offset: u64,
    /// Extra query parameters forwarded verbatim.
    pub params: Vec<(String, String)>,
}

/// Read access to the headless collection store.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn list_items(
        &self,
        collection_id: &str,
        query: &ListQuery,
    ) -> Result<ItemsPage, RemoteError>;

    async fn get_schema(&self, collection_id: &str)
    -> Result<CollectionSchemaResponse, RemoteError>;
}

/// Page-numbered contributor listing.
#[async_trait]
pub trait ContributorDirectory: Send + Sync {
    /// `page` starts at 1.
    async fn list_contributors(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<DocsPage<ContributorDoc>, RemoteError>;
}

/// Batched contributor lookup used while assembling a project.
#[async_trait]
pub trait ContributorResolver: Send + Sync {
    /// Contributors whose id is in `ids`. Unknown ids are skipped.
    async fn resolve_by_ids(&self, ids: &BTreeSet<String>)
    -> Result<Vec<Contributor>, RemoteError>;
}

/// Donation totals kept outside the collection store.
#[async_trait]
pub trait DonationLedger: Send + Sync {
    async fn donation_totals(&self) -> Result<DonationTotals, RemoteError>;
}
