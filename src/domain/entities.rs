//! Domain entities built from collection-store records.

use fundhub_api_types::CollectionItem;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::domain::types::Related;

/// A collection item as fetched, before any label resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub is_draft: bool,
    pub is_archived: bool,
    pub last_published: Option<String>,
    pub last_updated: Option<String>,
    pub created_on: Option<String>,
    pub fields: Map<String, Value>,
}

impl From<CollectionItem> for RawRecord {
    fn from(item: CollectionItem) -> Self {
        Self {
            id: item.id,
            is_draft: item.is_draft,
            is_archived: item.is_archived,
            last_published: item.last_published,
            last_updated: item.last_updated,
            created_on: item.created_on,
            fields: item.field_data,
        }
    }
}

impl RawRecord {
    /// String value of a field; empty strings count as absent.
    pub fn field_str(&self, slug: &str) -> Option<&str> {
        self.fields
            .get(slug)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn field_string(&self, slug: &str) -> Option<String> {
        self.field_str(slug).map(str::to_string)
    }

    pub fn field_bool(&self, slug: &str) -> bool {
        self.fields
            .get(slug)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn field_f64(&self, slug: &str) -> Option<f64> {
        self.fields.get(slug).and_then(Value::as_f64)
    }

    pub fn field_i64(&self, slug: &str) -> Option<i64> {
        self.fields.get(slug).and_then(|value| {
            value
                .as_i64()
                .or_else(|| value.as_f64().map(|number| number as i64))
        })
    }

    /// Id list stored under a reference field. Non-string entries are skipped.
    pub fn field_ids(&self, slug: &str) -> Vec<String> {
        match self.fields.get(slug) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// URL of an image field, which the store sends as `{ "url": ... }`.
    pub fn field_image_url(&self, slug: &str) -> Option<String> {
        match self.fields.get(slug)? {
            Value::Object(image) => image
                .get("url")
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            Value::String(url) if !url.is_empty() => Some(url.clone()),
            _ => None,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.field_bool("hidden")
    }

    /// Neither a draft nor archived.
    pub fn is_live(&self) -> bool {
        !self.is_draft && !self.is_archived
    }

    /// Live and not flagged hidden.
    pub fn is_publishable(&self) -> bool {
        self.is_live() && !self.is_hidden()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub status: String,
    pub project_type: Option<String>,
    pub hidden: bool,
    pub recurring: bool,
    pub total_paid: f64,
    pub service_fees_collected: f64,
    pub website: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
    pub discord: Option<String>,
    pub telegram: Option<String>,
    pub reddit: Option<String>,
    pub facebook: Option<String>,
    pub last_published: Option<String>,
    pub last_updated: Option<String>,
    pub created_on: Option<String>,
    #[serde(default)]
    pub bitcoin_contributors: Related<Contributor>,
    #[serde(default)]
    pub litecoin_contributors: Related<Contributor>,
    #[serde(default)]
    pub advocates: Related<Contributor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub summary: Option<String>,
    pub cover_image: Option<String>,
    pub status: String,
    pub project_type: Option<String>,
    pub total_paid: f64,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            slug: project.slug.clone(),
            summary: project.summary.clone(),
            cover_image: project.cover_image.clone(),
            status: project.status.clone(),
            project_type: project.project_type.clone(),
            total_paid: project.total_paid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub avatar: Option<String>,
    pub twitter_link: Option<String>,
    pub discord_link: Option<String>,
    pub github_link: Option<String>,
    pub youtube_link: Option<String>,
    pub linkedin_link: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqItem {
    pub id: String,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<String>,
    pub project: Option<String>,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub id: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub project: Option<String>,
    pub date: Option<String>,
    pub author_twitter_handle: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub name: Option<String>,
    pub x_post_link: Option<String>,
    pub youtube_link: Option<String>,
    pub reddit_link: Option<String>,
    pub projects: Vec<String>,
}

/// Donation totals reported by the optional ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationTotals {
    pub raised: f64,
    pub matched: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub projects_supported: u64,
    pub total_paid: f64,
    pub donations_raised: f64,
    pub donations_matched: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub computed_at: OffsetDateTime,
}
