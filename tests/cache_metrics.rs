use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fundhub::application::pagination::fetch_all_items;
use fundhub::application::sources::{CollectionSource, ListQuery, RemoteError};
use fundhub::cache::{
    CacheBackend, CacheError, CacheKey, CachePolicy, MemoryCacheBackend, StoredValue,
};
use fundhub_api_types::{CollectionSchemaResponse, ItemsPage};
use metrics_util::debugging::DebuggingRecorder;
use serde_json::Value;

struct DownBackend;

#[async_trait]
impl CacheBackend for DownBackend {
    async fn get(&self, _key: &str) -> Result<Option<StoredValue>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    fn name(&self) -> &'static str {
        "down"
    }
}

struct Throttled;

#[async_trait]
impl CollectionSource for Throttled {
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
        Err(RemoteError::RateLimited)
    }
}

#[tokio::test]
async fn cache_and_remote_metrics_are_emitted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // Miss, then hit, then an eviction from a one-entry memory backend.
    let memory = Arc::new(MemoryCacheBackend::with_capacity(
        NonZeroUsize::new(1).expect("non-zero"),
    ));
    let cache = CachePolicy::new(memory);
    let ttl = Duration::from_secs(60);
    let first: Result<Vec<u32>, RemoteError> = cache
        .cached(&CacheKey::Stats, ttl, || async { Ok(vec![1, 2]) })
        .await;
    assert_eq!(first, Ok(vec![1, 2]));
    let second: Result<Vec<u32>, RemoteError> = cache
        .cached(&CacheKey::Stats, ttl, || async { Ok(vec![9]) })
        .await;
    assert_eq!(second, Ok(vec![1, 2]));
    assert!(
        cache
            .store(&CacheKey::ActiveContributors, &Vec::<u32>::new(), ttl)
            .await
    );

    // Stale entry served after a failed refresh.
    let stale_memory = Arc::new(MemoryCacheBackend::with_capacity(
        NonZeroUsize::new(4).expect("non-zero"),
    ));
    stale_memory.insert("faqs:project:p1", serde_json::json!(["kept"]), Duration::ZERO);
    let stale_cache = CachePolicy::new(stale_memory);
    let served: Vec<String> = stale_cache
        .cached_or_stale(
            &CacheKey::ProjectFaqs("p1".into()),
            ttl,
            || async { Err::<Option<Vec<String>>, _>(RemoteError::RateLimited) },
        )
        .await;
    assert_eq!(served, vec!["kept".to_string()]);

    // Backend failure absorbed as a miss.
    let down = CachePolicy::new(Arc::new(DownBackend));
    let value: Result<u32, RemoteError> = down
        .cached(&CacheKey::PublishedProjects, ttl, || async { Ok(7) })
        .await;
    assert_eq!(value, Ok(7));

    // Rate-limited paging.
    let records = fetch_all_items(&Throttled, "projects", &[], 100)
        .await
        .expect("partial result");
    assert!(records.is_empty());

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for expected in [
        "fundhub_cache_hit_total",
        "fundhub_cache_miss_total",
        "fundhub_cache_memory_evict_total",
        "fundhub_cache_stale_served_total",
        "fundhub_cache_unavailable_total",
        "fundhub_remote_rate_limited_total",
    ] {
        assert!(names.contains(expected), "missing metric {expected}");
    }
}
