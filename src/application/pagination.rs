//! Whole-collection fetch helpers for the two paging styles upstream uses.

use fundhub_api_types::{ContributorDoc, MAX_PAGE_SIZE};
use metrics::counter;
use tracing::{debug, warn};

use crate::application::sources::{CollectionSource, ContributorDirectory, ListQuery, RemoteError};
use crate::domain::entities::RawRecord;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub(crate) const METRIC_REMOTE_RATE_LIMITED: &str = "fundhub_remote_rate_limited_total";

/// Fetch every item of `collection_id` by walking offsets.
///
/// A rate-limited page ends the walk and the items gathered so far are
/// returned, so a short or empty result may be incomplete. Any other error
/// propagates.
pub async fn fetch_all_items(
    source: &dyn CollectionSource,
    collection_id: &str,
    params: &[(String, String)],
    page_size: u32,
) -> Result<Vec<RawRecord>, RemoteError> {
    let limit = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut records: Vec<RawRecord> = Vec::new();

    loop {
        let query = ListQuery {
            limit,
            offset: records.len() as u64,
            params: params.to_vec(),
        };

        let page = match source.list_items(collection_id, &query).await {
            Ok(page) => page,
            Err(RemoteError::RateLimited) => {
                counter!(METRIC_REMOTE_RATE_LIMITED, "source" => "collections").increment(1);
                warn!(
                    target = "application::pagination::fetch_all_items",
                    collection_id,
                    fetched = records.len(),
                    "rate limited, returning partial collection"
                );
                return Ok(records);
            }
            Err(err) => return Err(err),
        };

        let total = page.reported_total();
        let received = page.items.len();
        records.extend(page.items.into_iter().map(RawRecord::from));

        debug!(
            target = "application::pagination::fetch_all_items",
            collection_id,
            offset = query.offset,
            received,
            total,
            "fetched collection page"
        );

        // An empty page means the reported total cannot be reached.
        if received == 0 || records.len() as u64 >= total {
            return Ok(records);
        }
    }
}

/// Fetch every contributor by walking page numbers from 1.
pub async fn fetch_all_contributors(
    directory: &dyn ContributorDirectory,
    page_size: u32,
) -> Result<Vec<ContributorDoc>, RemoteError> {
    let limit = page_size.max(1);
    let mut docs = Vec::new();
    let mut page = 1;

    loop {
        let response = directory.list_contributors(page, limit).await?;
        let received = response.docs.len();
        docs.extend(response.docs);

        if received == 0 || page >= response.total_pages {
            return Ok(docs);
        }
        page += 1;
    }
}
