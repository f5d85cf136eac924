//! Site-wide totals.

use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use tracing::{instrument, warn};

use crate::application::{error::AppError, projects::ProjectService, sources::DonationLedger};
use crate::cache::{CacheKey, CachePolicy};
use crate::domain::entities::{DonationTotals, Stats};

pub struct StatsService {
    projects: Arc<ProjectService>,
    ledger: Option<Arc<dyn DonationLedger>>,
    cache: CachePolicy,
    ttl: Duration,
}

impl StatsService {
    pub fn new(projects: Arc<ProjectService>, cache: CachePolicy, ttl: Duration) -> Self {
        Self {
            projects,
            ledger: None,
            cache,
            ttl,
        }
    }

    pub fn with_ledger(mut self, ledger: Option<Arc<dyn DonationLedger>>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Projects supported and their paid total, plus donation totals when a
    /// ledger is configured.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<Stats, AppError> {
        self.cache
            .cached(&CacheKey::Stats, self.ttl, move || async move {
                let projects = self.projects.all_visible_projects().await?;
                let donations = self.donation_totals().await;
                Ok::<_, AppError>(Stats {
                    projects_supported: projects.len() as u64,
                    total_paid: projects.iter().map(|project| project.total_paid).sum(),
                    donations_raised: donations.raised,
                    donations_matched: donations.matched,
                    computed_at: OffsetDateTime::now_utc(),
                })
            })
            .await
    }

    async fn donation_totals(&self) -> DonationTotals {
        let Some(ledger) = self.ledger.as_ref() else {
            return DonationTotals::default();
        };
        match ledger.donation_totals().await {
            Ok(totals) => totals,
            Err(err) => {
                warn!(
                    target = "application::stats::donation_totals",
                    error = %err,
                    "donation ledger unavailable, reporting zero"
                );
                DonationTotals::default()
            }
        }
    }
}
