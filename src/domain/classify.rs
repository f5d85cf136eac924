//! Status classification and display ordering for projects.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::domain::{entities::Project, types::Bucket};

/// Project names shown first, in this order, when no override is configured.
pub const DEFAULT_DISPLAY_PRIORITY: &[&str] = &[
    "Litecoin Foundation",
    "Litecoin Core",
    "MWEB",
    "Ordinals Lite",
    "Litewallet",
    "Litecoin Development Kit",
    "Litecoin Mempool Explorer",
];

const OPEN_LABELS: &[&str] = &["Open"];
const COMPLETED_LABELS: &[&str] = &["Completed", "Closed", "Bounty Completed", "Bounty Closed"];
const BOUNTY_LABELS: &[&str] = &["Bounty Open"];

/// Bucket for a resolved status label. Surrounding whitespace and ASCII case
/// are ignored.
pub fn classify(status: &str) -> Option<Bucket> {
    let status = status.trim();
    let matches = |labels: &[&str]| labels.iter().any(|label| label.eq_ignore_ascii_case(status));

    if matches(OPEN_LABELS) {
        Some(Bucket::OpenSource)
    } else if matches(COMPLETED_LABELS) {
        Some(Bucket::Completed)
    } else if matches(BOUNTY_LABELS) {
        Some(Bucket::OpenBounties)
    } else {
        None
    }
}

/// Fixed-priority ordering by project name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOrder {
    priority: Vec<String>,
}

impl Default for DisplayOrder {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_PRIORITY.iter().map(|name| name.to_string()))
    }
}

impl DisplayOrder {
    pub fn new(priority: impl IntoIterator<Item = String>) -> Self {
        Self {
            priority: priority.into_iter().collect(),
        }
    }

    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    fn rank(&self, name: &str) -> Option<usize> {
        self.priority.iter().position(|entry| entry == name)
    }

    /// Listed names first by list position, then the rest alphabetically.
    ///
    /// Alphabetical comparison folds case first and breaks ties on the exact
    /// string, so `apple` sorts before `Banana` and the order stays total.
    pub fn compare(&self, left: &str, right: &str) -> Ordering {
        match (self.rank(left), self.rank(right)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => left
                .to_lowercase()
                .cmp(&right.to_lowercase())
                .then_with(|| left.cmp(right)),
        }
    }

    pub fn sort(&self, projects: &mut [&Project]) {
        projects.sort_by(|left, right| self.compare(&left.name, &right.name));
    }
}

/// Projects partitioned for display. Entries borrow from the classified slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifiedBuckets<'a> {
    pub open: Vec<&'a Project>,
    pub completed: Vec<&'a Project>,
    pub bounties: Vec<&'a Project>,
}

impl ClassifiedBuckets<'_> {
    pub fn is_empty(&self) -> bool {
        self.open.is_empty() && self.completed.is_empty() && self.bounties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.open.len() + self.completed.len() + self.bounties.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    pub order: DisplayOrder,
    /// Show every visible project as open when nothing classifies.
    pub fallback_to_open: bool,
}

/// Partition the visible projects into display buckets.
///
/// Only the open bucket is reordered; the others keep input order.
pub fn classify_projects<'a>(
    projects: &'a [Project],
    options: &ClassifyOptions,
) -> ClassifiedBuckets<'a> {
    let visible: Vec<&Project> = projects.iter().filter(|project| !project.hidden).collect();
    let mut buckets = ClassifiedBuckets::default();

    for project in visible.iter().copied() {
        match classify(&project.status) {
            Some(Bucket::OpenSource) => buckets.open.push(project),
            Some(Bucket::Completed) => buckets.completed.push(project),
            Some(Bucket::OpenBounties) => buckets.bounties.push(project),
            None => debug!(
                target = "domain::classify::classify_projects",
                slug = %project.slug,
                status = %project.status,
                "status matches no bucket"
            ),
        }
    }

    if buckets.is_empty() && !visible.is_empty() && options.fallback_to_open {
        buckets.open = visible;
    }

    options.order.sort(&mut buckets.open);
    buckets
}
