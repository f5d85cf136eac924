//! Option-id → label resolution for enumerated collection fields.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::application::sources::{CollectionSource, RemoteError};
use crate::cache::{CacheKey, CachePolicy};
use crate::domain::{
    error::SchemaError,
    schema::{CollectionSchema, EnumLabelMap},
    transform::STATUS_FIELD,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to fetch collection schema: {0}")]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Clone)]
struct ResolvedLabels {
    labels: Arc<EnumLabelMap>,
    expires_at: Instant,
}

/// Resolves and holds label maps, one per (collection, field).
///
/// A map held in memory is used until its own TTL lapses, whatever the state
/// of the shared cache. Maps are swapped whole, so readers never observe a
/// partially refreshed map.
pub struct EnumResolver {
    source: Arc<dyn CollectionSource>,
    cache: CachePolicy,
    ttl: Duration,
    resolved: DashMap<(String, String), ResolvedLabels>,
}

impl EnumResolver {
    pub fn new(source: Arc<dyn CollectionSource>, cache: CachePolicy, ttl: Duration) -> Self {
        Self {
            source,
            cache,
            ttl,
            resolved: DashMap::new(),
        }
    }

    /// Label map for `field` of `collection_id`.
    ///
    /// Checks process memory, then the shared cache, then fetches the schema.
    #[instrument(skip(self))]
    pub async fn labels(
        &self,
        collection_id: &str,
        field: &str,
    ) -> Result<Arc<EnumLabelMap>, LabelError> {
        let slot = (collection_id.to_string(), field.to_string());
        let held = self.resolved.get(&slot).map(|entry| entry.value().clone());
        if let Some(held) = held
            && Instant::now() < held.expires_at
        {
            return Ok(held.labels);
        }

        let key = CacheKey::enum_labels(collection_id, field);
        let labels = match self
            .cache
            .cached(&key, self.ttl, move || self.fetch_labels(collection_id, field))
            .await
        {
            Ok(labels) => labels,
            Err(LabelError::Remote(RemoteError::RateLimited)) => {
                return Ok(self.degraded_labels(&key).await);
            }
            Err(err) => return Err(err),
        };

        debug!(
            target = "application::labels::labels",
            collection_id,
            field,
            options = labels.len(),
            "label map resolved"
        );

        let labels = Arc::new(labels);
        self.resolved.insert(
            slot,
            ResolvedLabels {
                labels: Arc::clone(&labels),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(labels)
    }

    /// Human-readable status for `status_id`, or the id itself when the
    /// schema does not list it.
    pub async fn resolve_status_label(
        &self,
        collection_id: &str,
        status_id: &str,
    ) -> Result<String, LabelError> {
        let labels = self.labels(collection_id, STATUS_FIELD).await?;
        Ok(labels.label(status_id).to_string())
    }

    /// Answer for a rate-limited schema fetch: the shared entry at any age,
    /// else an empty map so ids echo through. Neither is held, so the next
    /// call asks for the schema again.
    async fn degraded_labels(&self, key: &CacheKey) -> Arc<EnumLabelMap> {
        let stale = self.cache.lookup::<EnumLabelMap>(key).await.into_value();
        warn!(
            target = "application::labels::labels",
            key = %key,
            stale = stale.is_some(),
            "schema fetch rate limited, using degraded label map"
        );
        Arc::new(stale.unwrap_or_default())
    }

    async fn fetch_labels(
        &self,
        collection_id: &str,
        field: &str,
    ) -> Result<EnumLabelMap, LabelError> {
        let response = self.source.get_schema(collection_id).await?;
        let schema = CollectionSchema {
            collection_id: collection_id.to_string(),
            ..CollectionSchema::from(response)
        };
        Ok(schema.enum_labels(field)?)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        num::NonZeroUsize,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use fundhub_api_types::{
        CollectionSchemaResponse, FieldOption, FieldValidations, ItemsPage, SchemaField,
    };
    use serde_json::json;

    use super::*;
    use crate::application::sources::ListQuery;
    use crate::cache::MemoryCacheBackend;

    const TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);

    struct SchemaSource {
        fetches: AtomicUsize,
        fields: Vec<SchemaField>,
    }

    impl SchemaSource {
        fn with_status(options: Option<Vec<(&str, &str)>>) -> Self {
            let options = options.map(|options| {
                options
                    .into_iter()
                    .map(|(id, name)| FieldOption {
                        id: id.into(),
                        name: name.into(),
                    })
                    .collect()
            });
            Self {
                fetches: AtomicUsize::new(0),
                fields: vec![SchemaField {
                    id: "f1".into(),
                    slug: "status".into(),
                    field_type: "Option".into(),
                    display_name: "Status".into(),
                    validations: Some(FieldValidations { options }),
                }],
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CollectionSource for SchemaSource {
        async fn list_items(
            &self,
            _collection_id: &str,
            _query: &ListQuery,
        ) -> Result<ItemsPage, RemoteError> {
            Ok(ItemsPage::default())
        }

        async fn get_schema(
            &self,
            collection_id: &str,
        ) -> Result<CollectionSchemaResponse, RemoteError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(CollectionSchemaResponse {
                id: collection_id.into(),
                display_name: "Projects".into(),
                fields: self.fields.clone(),
            })
        }
    }

    /// Answers every schema request with 429.
    #[derive(Default)]
    struct ThrottledSchema {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl CollectionSource for ThrottledSchema {
        async fn list_items(
            &self,
            _collection_id: &str,
            _query: &ListQuery,
        ) -> Result<ItemsPage, RemoteError> {
            Err(RemoteError::RateLimited)
        }

        async fn get_schema(
            &self,
            _collection_id: &str,
        ) -> Result<CollectionSchemaResponse, RemoteError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Err(RemoteError::RateLimited)
        }
    }

    fn open_closed() -> Arc<SchemaSource> {
        Arc::new(SchemaSource::with_status(Some(vec![
            ("a1", " Open "),
            ("b2", "Closed"),
        ])))
    }

    fn memory() -> Arc<MemoryCacheBackend> {
        Arc::new(MemoryCacheBackend::with_capacity(
            NonZeroUsize::new(8).expect("non-zero"),
        ))
    }

    #[tokio::test]
    async fn resolves_trimmed_labels_and_echoes_unknown() {
        let source = open_closed();
        let resolver = EnumResolver::new(source.clone(), CachePolicy::disabled(), TTL);

        assert_eq!(
            resolver.resolve_status_label("projects", "a1").await,
            Ok("Open".to_string())
        );
        assert_eq!(
            resolver.resolve_status_label("projects", "b2").await,
            Ok("Closed".to_string())
        );
        assert_eq!(
            resolver.resolve_status_label("projects", "zz").await,
            Ok("zz".to_string())
        );
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn held_map_is_preferred_over_shared_cache() {
        let source = open_closed();
        let resolver = EnumResolver::new(source.clone(), CachePolicy::disabled(), TTL);

        resolver.labels("projects", "status").await.expect("first");
        resolver.labels("projects", "status").await.expect("second");
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn shared_cache_feeds_a_fresh_resolver() {
        let memory = memory();
        let first_source = open_closed();
        let first = EnumResolver::new(first_source.clone(), CachePolicy::new(memory.clone()), TTL);
        first.labels("projects", "status").await.expect("resolve");
        assert_eq!(
            memory.lookup("webflow:projects:status-map").map(|entry| entry.value),
            Some(json!({ "a1": "Open", "b2": "Closed" }))
        );

        let second_source = open_closed();
        let second = EnumResolver::new(second_source.clone(), CachePolicy::new(memory), TTL);
        let labels = second.labels("projects", "status").await.expect("from cache");
        assert_eq!(labels.label("a1"), "Open");
        assert_eq!(second_source.fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn held_map_refreshes_after_ttl() {
        let source = open_closed();
        let ttl = Duration::from_secs(60);
        let resolver = EnumResolver::new(source.clone(), CachePolicy::disabled(), ttl);

        resolver.labels("projects", "status").await.expect("first");
        tokio::time::advance(ttl + Duration::from_secs(1)).await;
        resolver.labels("projects", "status").await.expect("refreshed");
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn missing_field_fails() {
        let source = Arc::new(SchemaSource {
            fetches: AtomicUsize::new(0),
            fields: Vec::new(),
        });
        let resolver = EnumResolver::new(source, CachePolicy::disabled(), TTL);
        let err = resolver
            .labels("projects", "status")
            .await
            .expect_err("missing");
        assert_eq!(
            err,
            LabelError::Schema(SchemaError::field_missing("projects", "status"))
        );
    }

    #[tokio::test]
    async fn field_without_options_fails() {
        let source = Arc::new(SchemaSource::with_status(None));
        let resolver = EnumResolver::new(source, CachePolicy::disabled(), TTL);
        let err = resolver
            .labels("projects", "status")
            .await
            .expect_err("not enumerable");
        assert!(matches!(
            err,
            LabelError::Schema(SchemaError::NotEnumerable { .. })
        ));
    }

    #[tokio::test]
    async fn failed_resolution_is_not_held() {
        let source = Arc::new(SchemaSource::with_status(None));
        let resolver = EnumResolver::new(source.clone(), CachePolicy::disabled(), TTL);
        let _ = resolver.labels("projects", "status").await;
        let _ = resolver.labels("projects", "status").await;
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn rate_limited_schema_serves_expired_shared_map() {
        let memory = memory();
        memory.insert(
            "webflow:projects:status-map",
            json!({ "a1": "Open" }),
            Duration::ZERO,
        );
        let source = Arc::new(ThrottledSchema::default());
        let resolver = EnumResolver::new(source.clone(), CachePolicy::new(memory), TTL);

        assert_eq!(
            resolver.resolve_status_label("projects", "a1").await,
            Ok("Open".to_string())
        );
        resolver.labels("projects", "status").await.expect("degraded");
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rate_limited_schema_without_entry_echoes_ids() {
        let source = Arc::new(ThrottledSchema::default());
        let resolver = EnumResolver::new(source, CachePolicy::disabled(), TTL);

        let labels = resolver.labels("projects", "status").await.expect("degraded");
        assert!(labels.is_empty());
        assert_eq!(
            resolver.resolve_status_label("projects", "a1").await,
            Ok("a1".to_string())
        );
    }
}
