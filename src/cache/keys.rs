//! Cache key definitions.
//!
//! Every key renders as `<domain>:<scope>:<identifier>`; the rendered form is
//! what external backends store, so it must stay stable across releases.

use std::fmt;

/// A cached value, identified by what it holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Published, visible projects.
    PublishedProjects,
    /// Option id → label map for one enumerated field of a collection.
    EnumLabels { collection_id: String, field: String },
    /// A single project, with contributors folded in.
    ProjectBySlug(String),
    /// Every contributor in the directory.
    ActiveContributors,
    ProjectFaqs(String),
    ProjectUpdates(String),
    ProjectPosts(String),
    /// Site-wide totals.
    Stats,
}

impl CacheKey {
    pub fn enum_labels(collection_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self::EnumLabels {
            collection_id: collection_id.into(),
            field: field.into(),
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheKey::PublishedProjects => "published_projects",
            CacheKey::EnumLabels { .. } => "enum_labels",
            CacheKey::ProjectBySlug(_) => "project",
            CacheKey::ActiveContributors => "contributors",
            CacheKey::ProjectFaqs(_) => "faqs",
            CacheKey::ProjectUpdates(_) => "updates",
            CacheKey::ProjectPosts(_) => "posts",
            CacheKey::Stats => "stats",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::PublishedProjects => f.write_str("webflow:projects:published"),
            CacheKey::EnumLabels {
                collection_id,
                field,
            } => write!(f, "webflow:{collection_id}:{field}-map"),
            CacheKey::ProjectBySlug(slug) => write!(f, "webflow:project:{slug}"),
            CacheKey::ActiveContributors => f.write_str("payload:contributors:active"),
            CacheKey::ProjectFaqs(id) => write!(f, "faqs:project:{id}"),
            CacheKey::ProjectUpdates(id) => write!(f, "updates:project:{id}"),
            CacheKey::ProjectPosts(id) => write!(f, "posts:project:{id}"),
            CacheKey::Stats => f.write_str("stats:all"),
        }
    }
}
