//! Wire types for the remote services fundhub reads from.
//!
//! Two upstreams are modelled here:
//!
//! - the collection store (`/collections/{id}/items`, `/collections/{id}`),
//!   which pages by `limit`/`offset` and reports a `total`;
//! - the contributor directory (`/contributors`), which pages by a 1-based
//!   `page` number and reports `totalPages`.
//!
//! Nothing in this crate performs I/O.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Largest page the collection store accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Collection store
// ============================================================================

/// One page of `GET /collections/{id}/items`.
///
/// Older deployments report the paging counters at the top level, newer ones
/// nest them under `pagination`. Both shapes are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsPage {
    #[serde(default)]
    pub items: Vec<CollectionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl ItemsPage {
    /// Total number of items in the collection, as reported by the store.
    ///
    /// Falls back to the size of this page when neither counter is present.
    pub fn reported_total(&self) -> u64 {
        self.pagination
            .as_ref()
            .map(|pagination| pagination.total)
            .or(self.total)
            .unwrap_or(self.items.len() as u64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub total: u64,
}

/// A collection item exactly as the store returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    pub id: String,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default)]
    pub field_data: Map<String, Value>,
}

/// Response of `GET /collections/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchemaResponse {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    #[serde(default)]
    pub id: String,
    pub slug: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<FieldValidations>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValidations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub id: String,
    pub name: String,
}

// ============================================================================
// Contributor directory
// ============================================================================

/// One page of a page-numbered directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsPage<T> {
    #[serde(default = "Vec::new")]
    pub docs: Vec<T>,
    #[serde(default)]
    pub total_docs: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorDoc {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<ProfilePicture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A profile picture is either a bare URL or an uploaded media document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfilePicture {
    Url(String),
    Media {
        #[serde(default)]
        id: Option<String>,
        url: String,
        #[serde(default)]
        alt: Option<String>,
    },
}

impl ProfilePicture {
    pub fn url(&self) -> &str {
        match self {
            ProfilePicture::Url(url) => url,
            ProfilePicture::Media { url, .. } => url,
        }
    }
}
