//! Project catalog reads: the visible list, single projects by slug, and the
//! classified bucket view.

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::application::{
    error::AppError,
    labels::EnumResolver,
    pagination::{DEFAULT_PAGE_SIZE, fetch_all_items},
    sources::{CollectionSource, ContributorResolver},
};
use crate::cache::{CacheKey, CacheLookup, CachePolicy, METRIC_CACHE_STALE_SERVED};
use crate::domain::{
    classify::{ClassifiedBuckets, ClassifyOptions, classify_projects},
    entities::{Contributor, Project, ProjectSummary, RawRecord},
    schema::EnumLabelMap,
    transform::{RelationIds, STATUS_FIELD, remap_stale_statuses, to_project},
    types::Related,
};

const SOURCE: &str = "application::projects";

#[derive(Debug, Clone)]
pub struct ProjectCatalogConfig {
    pub collection_id: String,
    pub page_size: u32,
    pub ttl: Duration,
    pub classify: ClassifyOptions,
}

impl ProjectCatalogConfig {
    pub fn new(collection_id: impl Into<String>, ttl: Duration) -> Self {
        Self {
            collection_id: collection_id.into(),
            page_size: DEFAULT_PAGE_SIZE,
            ttl,
            classify: ClassifyOptions::default(),
        }
    }
}

pub struct ProjectService {
    source: Arc<dyn CollectionSource>,
    labels: Arc<EnumResolver>,
    contributors: Option<Arc<dyn ContributorResolver>>,
    cache: CachePolicy,
    config: ProjectCatalogConfig,
}

impl ProjectService {
    pub fn new(
        source: Arc<dyn CollectionSource>,
        labels: Arc<EnumResolver>,
        cache: CachePolicy,
        config: ProjectCatalogConfig,
    ) -> Self {
        Self {
            source,
            labels,
            contributors: None,
            cache,
            config,
        }
    }

    pub fn with_contributors(self, resolver: Arc<dyn ContributorResolver>) -> Self {
        self.with_contributors_opt(Some(resolver))
    }

    pub fn with_contributors_opt(mut self, resolver: Option<Arc<dyn ContributorResolver>>) -> Self {
        self.contributors = resolver;
        self
    }

    /// Every published, non-hidden project.
    ///
    /// The list is cached whole. An empty fetch is never written; the previous
    /// entry, at any age, is served instead when there is one. Statuses that
    /// no longer match a schema label are re-resolved against the current map
    /// before returning, so a cached list never outlives a relabeling in the
    /// schema.
    #[instrument(skip(self))]
    pub async fn all_visible_projects(&self) -> Result<Vec<Project>, AppError> {
        let labels = self
            .labels
            .labels(&self.config.collection_id, STATUS_FIELD)
            .await?;
        let label_map: &EnumLabelMap = &labels;

        let key = CacheKey::PublishedProjects;
        let lookup = self.cache.lookup::<Vec<Project>>(&key).await;
        let reachable = lookup.backend_reachable();
        let projects = match lookup {
            CacheLookup::Fresh(projects) => projects,
            previous => {
                let fetched = visible_projects(&self.fetch_records().await?, label_map);
                if !fetched.is_empty() {
                    if reachable {
                        self.cache.store(&key, &fetched, self.config.ttl).await;
                    }
                    fetched
                } else if let Some(previous) = previous.into_value() {
                    // An empty fetch is what a rate-limited first page looks like.
                    counter!(METRIC_CACHE_STALE_SERVED, "kind" => key.kind()).increment(1);
                    warn!(
                        target = "application::projects::all_visible_projects",
                        cached = previous.len(),
                        "fetched project list is empty, keeping the cached list"
                    );
                    previous
                } else {
                    fetched
                }
            }
        };

        Ok(remap_stale_statuses(projects, label_map))
    }

    /// The live project whose slug is `slug`, with its contributor relations
    /// resolved.
    ///
    /// Hidden projects are returned; only drafts and archived records are
    /// excluded. `None` when no live record has the slug.
    #[instrument(skip(self))]
    pub async fn project_by_slug(&self, slug: &str) -> Result<Option<Project>, AppError> {
        let key = CacheKey::ProjectBySlug(slug.to_string());
        let lookup = self.cache.lookup::<Project>(&key).await;
        let reachable = !matches!(lookup, CacheLookup::Unavailable);
        if let CacheLookup::Fresh(project) = lookup {
            return Ok(Some(project));
        }

        let labels = self
            .labels
            .labels(&self.config.collection_id, STATUS_FIELD)
            .await?;
        let records = self.fetch_records().await?;
        let Some(record) = records
            .iter()
            .find(|record| record.is_live() && record.field_str("slug") == Some(slug))
        else {
            debug!(
                target = "application::projects::project_by_slug",
                slug,
                scanned = records.len(),
                "no live project with slug"
            );
            return Ok(None);
        };

        let mut project = to_project(record, &labels)?;
        let ids = RelationIds::of(record);
        let (bitcoin, litecoin, advocates) = futures::join!(
            self.related(&ids.bitcoin_contributors, "bitcoin_contributors"),
            self.related(&ids.litecoin_contributors, "litecoin_contributors"),
            self.related(&ids.advocates, "advocates"),
        );
        project.bitcoin_contributors = bitcoin;
        project.litecoin_contributors = litecoin;
        project.advocates = advocates;

        if reachable {
            self.cache.store(&key, &project, self.config.ttl).await;
        }
        Ok(Some(project))
    }

    pub async fn project_summaries(&self) -> Result<Vec<ProjectSummary>, AppError> {
        let projects = self.all_visible_projects().await?;
        Ok(projects.iter().map(ProjectSummary::from).collect())
    }

    /// Sort `projects` into display buckets using the configured order.
    pub fn classified_buckets<'a>(&self, projects: &'a [Project]) -> ClassifiedBuckets<'a> {
        classify_projects(projects, &self.config.classify)
    }

    pub async fn resolve_status_label(&self, status_id: &str) -> Result<String, AppError> {
        Ok(self
            .labels
            .resolve_status_label(&self.config.collection_id, status_id)
            .await?)
    }

    async fn fetch_records(&self) -> Result<Vec<RawRecord>, AppError> {
        Ok(fetch_all_items(
            self.source.as_ref(),
            &self.config.collection_id,
            &[],
            self.config.page_size,
        )
        .await?)
    }

    async fn related(&self, ids: &[String], relation: &'static str) -> Related<Contributor> {
        let Some(resolver) = self.contributors.as_ref() else {
            return Related::NotFetched;
        };
        let wanted: BTreeSet<String> = ids.iter().cloned().collect();
        if wanted.is_empty() {
            return Related::Empty;
        }

        match resolver.resolve_by_ids(&wanted).await {
            Ok(found) => Related::from_lookup(found),
            Err(err) => {
                warn!(
                    target = "application::projects::related",
                    relation,
                    error = %err,
                    "contributor lookup failed, relation left unresolved"
                );
                Related::NotFetched
            }
        }
    }
}

fn visible_projects(records: &[RawRecord], labels: &EnumLabelMap) -> Vec<Project> {
    records
        .iter()
        .filter(|record| record.is_publishable())
        .filter_map(|record| match to_project(record, labels) {
            Ok(project) => Some(project),
            Err(err) => {
                warn!(
                    target = SOURCE,
                    record_id = %record.id,
                    error = %err,
                    "skipping malformed project record"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use fundhub_api_types::{
        CollectionItem, CollectionSchemaResponse, FieldOption, FieldValidations, ItemsPage,
        SchemaField,
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::application::sources::{ListQuery, RemoteError};
    use crate::domain::types::Bucket;

    const TTL: Duration = Duration::from_secs(60);

    struct Catalog {
        items: Vec<CollectionItem>,
        list_calls: AtomicUsize,
    }

    fn item(id: &str, fields: Value) -> CollectionItem {
        let Value::Object(fields) = fields else {
            panic!("fields must be an object");
        };
        CollectionItem {
            id: id.into(),
            field_data: fields,
            ..Default::default()
        }
    }

    #[async_trait]
    impl CollectionSource for Catalog {
        async fn list_items(
            &self,
            _collection_id: &str,
            _query: &ListQuery,
        ) -> Result<ItemsPage, RemoteError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(ItemsPage {
                items: self.items.clone(),
                pagination: None,
                total: Some(self.items.len() as u64),
            })
        }

        async fn get_schema(
            &self,
            collection_id: &str,
        ) -> Result<CollectionSchemaResponse, RemoteError> {
            Ok(CollectionSchemaResponse {
                id: collection_id.into(),
                display_name: "Projects".into(),
                fields: vec![SchemaField {
                    id: "f".into(),
                    slug: "status".into(),
                    field_type: "Option".into(),
                    display_name: "Status".into(),
                    validations: Some(FieldValidations {
                        options: Some(vec![
                            FieldOption {
                                id: "o1".into(),
                                name: "Open".into(),
                            },
                            FieldOption {
                                id: "c1".into(),
                                name: "Bounty Closed".into(),
                            },
                        ]),
                    }),
                }],
            })
        }
    }

    struct Resolver {
        fail: bool,
    }

    #[async_trait]
    impl ContributorResolver for Resolver {
        async fn resolve_by_ids(
            &self,
            ids: &BTreeSet<String>,
        ) -> Result<Vec<Contributor>, RemoteError> {
            if self.fail {
                return Err(RemoteError::unavailable(Some(500), "directory down"));
            }
            Ok(ids
                .iter()
                .filter(|id| id.as_str() != "ghost")
                .map(|id| Contributor {
                    id: id.clone(),
                    name: id.to_uppercase(),
                    slug: id.clone(),
                    avatar: None,
                    twitter_link: None,
                    discord_link: None,
                    github_link: None,
                    youtube_link: None,
                    linkedin_link: None,
                    email: None,
                })
                .collect())
        }
    }

    fn catalog() -> Arc<Catalog> {
        let mut draft = item("p4", json!({ "name": "Draft", "slug": "draft", "status": "o1" }));
        draft.is_draft = true;
        Arc::new(Catalog {
            items: vec![
                item(
                    "p1",
                    json!({
                        "name": "Litewallet",
                        "slug": "litewallet",
                        "status": "o1",
                        "total-paid": 10.5,
                        "bitcoin-contributors-2": ["alice", "ghost"],
                        "advocates": ["carol"]
                    }),
                ),
                item(
                    "p2",
                    json!({ "name": "Hidden", "slug": "hidden", "status": "o1", "hidden": true }),
                ),
                item("p3", json!({ "name": "Closed", "slug": "closed", "status": "c1" })),
                item("p5", json!({ "slug": "nameless", "status": "o1" })),
                draft,
            ],
            list_calls: AtomicUsize::new(0),
        })
    }

    fn service(source: Arc<Catalog>) -> ProjectService {
        let labels = Arc::new(EnumResolver::new(
            source.clone(),
            CachePolicy::disabled(),
            TTL,
        ));
        ProjectService::new(
            source,
            labels,
            CachePolicy::disabled(),
            ProjectCatalogConfig::new("projects", TTL),
        )
    }

    #[tokio::test]
    async fn visible_projects_skip_hidden_drafts_and_malformed() {
        let projects = service(catalog()).all_visible_projects().await.expect("projects");
        let slugs: Vec<_> = projects.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["litewallet", "closed"]);
        assert_eq!(projects[0].status, "Open");
        assert_eq!(projects[1].status, "Bounty Closed");
        assert!(!projects[0].bitcoin_contributors.is_fetched());
    }

    #[tokio::test]
    async fn slug_lookup_returns_hidden_but_not_drafts() {
        let service = service(catalog());
        let hidden = service.project_by_slug("hidden").await.expect("lookup");
        assert!(hidden.is_some_and(|project| project.hidden));
        assert_eq!(service.project_by_slug("draft").await.expect("lookup"), None);
        assert_eq!(service.project_by_slug("nope").await.expect("lookup"), None);
    }

    #[tokio::test]
    async fn relations_resolve_through_the_resolver() {
        let service = service(catalog()).with_contributors(Arc::new(Resolver { fail: false }));
        let project = service
            .project_by_slug("litewallet")
            .await
            .expect("lookup")
            .expect("found");

        let bitcoin: Vec<_> = project
            .bitcoin_contributors
            .items()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(bitcoin, vec!["alice"]);
        assert_eq!(project.litecoin_contributors, Related::Empty);
        assert_eq!(project.advocates.items().len(), 1);
    }

    #[tokio::test]
    async fn resolver_failure_leaves_relations_unfetched() {
        let service = service(catalog()).with_contributors(Arc::new(Resolver { fail: true }));
        let project = service
            .project_by_slug("litewallet")
            .await
            .expect("lookup")
            .expect("found");
        assert_eq!(project.bitcoin_contributors, Related::NotFetched);
        assert_eq!(project.advocates, Related::NotFetched);
        assert_eq!(project.litecoin_contributors, Related::Empty);
    }

    #[tokio::test]
    async fn no_resolver_means_not_fetched() {
        let project = service(catalog())
            .project_by_slug("litewallet")
            .await
            .expect("lookup")
            .expect("found");
        assert_eq!(project.bitcoin_contributors, Related::NotFetched);
        assert_eq!(project.litecoin_contributors, Related::NotFetched);
    }

    #[tokio::test]
    async fn buckets_and_summaries_follow_visible_list() {
        let service = service(catalog());
        let projects = service.all_visible_projects().await.expect("projects");
        let buckets = service.classified_buckets(&projects);
        assert_eq!(buckets.open.len(), 1);
        assert_eq!(buckets.completed.len(), 1);
        assert!(buckets.bounties.is_empty());
        assert_eq!(
            crate::domain::classify::classify(&buckets.completed[0].status),
            Some(Bucket::Completed)
        );

        let summaries = service.project_summaries().await.expect("summaries");
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].total_paid, 10.5);
    }

    #[tokio::test]
    async fn status_label_uses_catalog_collection() {
        let service = service(catalog());
        assert_eq!(service.resolve_status_label("c1").await.expect("label"), "Bounty Closed");
        assert_eq!(service.resolve_status_label("x9").await.expect("label"), "x9");
    }
}
