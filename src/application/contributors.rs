//! Contributor directory reads.

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use fundhub_api_types::ContributorDoc;
use tracing::instrument;

use crate::application::pagination::{DEFAULT_PAGE_SIZE, fetch_all_contributors};
use crate::application::sources::{ContributorDirectory, ContributorResolver, RemoteError};
use crate::cache::{CacheKey, CachePolicy};
use crate::domain::entities::Contributor;

impl From<ContributorDoc> for Contributor {
    fn from(doc: ContributorDoc) -> Self {
        Self {
            avatar: doc
                .profile_picture
                .as_ref()
                .map(|picture| picture.url().to_string())
                .filter(|url| !url.is_empty()),
            id: doc.id,
            name: doc.name,
            slug: doc.slug,
            twitter_link: doc.twitter_link,
            discord_link: doc.discord_link,
            github_link: doc.github_link,
            youtube_link: doc.youtube_link,
            linkedin_link: doc.linkedin_link,
            email: doc.email,
        }
    }
}

pub struct ContributorService {
    directory: Arc<dyn ContributorDirectory>,
    cache: CachePolicy,
    ttl: Duration,
    page_size: u32,
}

impl ContributorService {
    pub fn new(directory: Arc<dyn ContributorDirectory>, cache: CachePolicy, ttl: Duration) -> Self {
        Self {
            directory,
            cache,
            ttl,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every contributor in directory order.
    #[instrument(skip(self))]
    pub async fn all_active(&self) -> Result<Vec<Contributor>, RemoteError> {
        self.cache
            .cached(&CacheKey::ActiveContributors, self.ttl, move || async move {
                let docs = fetch_all_contributors(self.directory.as_ref(), self.page_size).await?;
                Ok(docs.into_iter().map(Contributor::from).collect())
            })
            .await
    }
}

#[async_trait]
impl ContributorResolver for ContributorService {
    async fn resolve_by_ids(
        &self,
        ids: &BTreeSet<String>,
    ) -> Result<Vec<Contributor>, RemoteError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let contributors = self.all_active().await?;
        Ok(contributors
            .into_iter()
            .filter(|contributor| ids.contains(&contributor.id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fundhub_api_types::{DocsPage, ProfilePicture};

    use super::*;

    struct Directory {
        docs: Vec<ContributorDoc>,
        calls: AtomicUsize,
    }

    fn doc(id: &str, picture: Option<ProfilePicture>) -> ContributorDoc {
        ContributorDoc {
            id: id.into(),
            name: format!("Name {id}"),
            slug: id.into(),
            profile_picture: picture,
            twitter_link: None,
            discord_link: None,
            github_link: Some(format!("https://github.com/{id}")),
            youtube_link: None,
            linkedin_link: None,
            email: None,
        }
    }

    #[async_trait]
    impl ContributorDirectory for Directory {
        async fn list_contributors(
            &self,
            page: u32,
            limit: u32,
        ) -> Result<DocsPage<ContributorDoc>, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DocsPage {
                docs: if page == 1 { self.docs.clone() } else { Vec::new() },
                total_docs: self.docs.len() as u64,
                limit: u64::from(limit),
                total_pages: 1,
                page: Some(page),
                has_next_page: false,
            })
        }
    }

    fn service(docs: Vec<ContributorDoc>) -> (ContributorService, Arc<Directory>) {
        let directory = Arc::new(Directory {
            docs,
            calls: AtomicUsize::new(0),
        });
        let service = ContributorService::new(
            directory.clone(),
            CachePolicy::disabled(),
            Duration::from_secs(60),
        );
        (service, directory)
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[tokio::test]
    async fn resolves_known_ids_in_directory_order() {
        let (service, _) = service(vec![doc("c", None), doc("a", None), doc("b", None)]);
        let resolved = service
            .resolve_by_ids(&ids(&["b", "c", "missing"]))
            .await
            .expect("resolved");
        let found: Vec<_> = resolved.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(found, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn empty_id_set_skips_directory() {
        let (service, directory) = service(vec![doc("a", None)]);
        let resolved = service.resolve_by_ids(&BTreeSet::new()).await.expect("empty");
        assert!(resolved.is_empty());
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn avatar_comes_from_either_picture_shape() {
        let (service, _) = service(vec![
            doc("a", Some(ProfilePicture::Url("https://cdn/a.png".into()))),
            doc(
                "b",
                Some(ProfilePicture::Media {
                    id: Some("m".into()),
                    url: "https://cdn/b.png".into(),
                    alt: None,
                }),
            ),
            doc("c", None),
        ]);
        let all = service.all_active().await.expect("contributors");
        assert_eq!(all[0].avatar.as_deref(), Some("https://cdn/a.png"));
        assert_eq!(all[1].avatar.as_deref(), Some("https://cdn/b.png"));
        assert_eq!(all[2].avatar, None);
        assert_eq!(all[2].github_link.as_deref(), Some("https://github.com/c"));
    }
}
