//! FAQs, updates and social posts attached to a project.
//!
//! These reads never fail. A remote error or a rate-limited empty fetch
//! serves whatever the cache still holds for the project, however old, and
//! otherwise an empty list.

use std::{sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{error, instrument, warn};

use crate::application::{
    pagination::{DEFAULT_PAGE_SIZE, fetch_all_items},
    projects::ProjectService,
    sources::{CollectionSource, RemoteError},
};
use crate::cache::{CacheKey, CachePolicy};
use crate::domain::{
    entities::{FaqItem, Post, RawRecord, Update},
    transform::{project_faqs, project_posts, project_updates},
};

/// Collection ids for the per-project content types. A type without an id
/// reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentCollections {
    pub faqs: Option<String>,
    pub updates: Option<String>,
    pub posts: Option<String>,
}

pub struct ProjectContentService {
    source: Arc<dyn CollectionSource>,
    projects: Arc<ProjectService>,
    cache: CachePolicy,
    collections: ContentCollections,
    ttl: Duration,
    page_size: u32,
}

impl ProjectContentService {
    pub fn new(
        source: Arc<dyn CollectionSource>,
        projects: Arc<ProjectService>,
        cache: CachePolicy,
        collections: ContentCollections,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            projects,
            cache,
            collections,
            ttl,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Live FAQ entries for the project, ordered by their `order` field.
    #[instrument(skip(self))]
    pub async fn faqs_by_project_id(&self, project_id: &str) -> Vec<FaqItem> {
        self.for_project(
            "faqs",
            self.collections.faqs.as_deref(),
            CacheKey::ProjectFaqs(project_id.to_string()),
            |records| project_faqs(records, project_id),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn updates_by_project_id(&self, project_id: &str) -> Vec<Update> {
        self.for_project(
            "updates",
            self.collections.updates.as_deref(),
            CacheKey::ProjectUpdates(project_id.to_string()),
            |records| project_updates(records, project_id),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn posts_by_project_id(&self, project_id: &str) -> Vec<Post> {
        self.for_project(
            "posts",
            self.collections.posts.as_deref(),
            CacheKey::ProjectPosts(project_id.to_string()),
            |records| project_posts(records, project_id),
        )
        .await
    }

    pub async fn faqs_by_project_slug(&self, slug: &str) -> Vec<FaqItem> {
        match self.project_id_for(slug).await {
            Some(id) => self.faqs_by_project_id(&id).await,
            None => Vec::new(),
        }
    }

    pub async fn updates_by_project_slug(&self, slug: &str) -> Vec<Update> {
        match self.project_id_for(slug).await {
            Some(id) => self.updates_by_project_id(&id).await,
            None => Vec::new(),
        }
    }

    pub async fn posts_by_project_slug(&self, slug: &str) -> Vec<Post> {
        match self.project_id_for(slug).await {
            Some(id) => self.posts_by_project_id(&id).await,
            None => Vec::new(),
        }
    }

    async fn project_id_for(&self, slug: &str) -> Option<String> {
        match self.projects.project_by_slug(slug).await {
            Ok(Some(project)) => Some(project.id),
            Ok(None) => {
                warn!(
                    target = "application::related::project_id_for",
                    slug,
                    "no project with slug"
                );
                None
            }
            Err(err) => {
                warn!(
                    target = "application::related::project_id_for",
                    slug,
                    error = %err,
                    "project lookup failed"
                );
                None
            }
        }
    }

    async fn for_project<T, F>(
        &self,
        kind: &'static str,
        collection_id: Option<&str>,
        key: CacheKey,
        select: F,
    ) -> Vec<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce(&[RawRecord]) -> Vec<T> + Send,
    {
        let Some(collection_id) = collection_id else {
            error!(
                target = "application::related::for_project",
                kind,
                "collection id not configured"
            );
            return Vec::new();
        };

        self.cache
            .cached_or_stale(&key, self.ttl, move || async move {
                let records =
                    fetch_all_items(self.source.as_ref(), collection_id, &[], self.page_size)
                        .await?;
                // Empty usually means the first page was rate limited.
                if records.is_empty() {
                    return Ok(None);
                }
                Ok::<_, RemoteError>(Some(select(&records)))
            })
            .await
    }
}
