//! Shared domain enumerations.

use serde::{Deserialize, Serialize};

/// Display partition a project lands in after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    OpenSource,
    Completed,
    OpenBounties,
}

impl Bucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::OpenSource => "open_source",
            Bucket::Completed => "completed",
            Bucket::OpenBounties => "open_bounties",
        }
    }
}

/// Outcome of resolving a related-entity id list.
///
/// `NotFetched` covers both "no lookup was attempted" and "the lookup failed";
/// `Empty` is a lookup that succeeded and matched nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "items", rename_all = "snake_case")]
pub enum Related<T> {
    NotFetched,
    Empty,
    Populated(Vec<T>),
}

impl<T> Default for Related<T> {
    fn default() -> Self {
        Related::NotFetched
    }
}

impl<T> Related<T> {
    pub fn from_lookup(items: Vec<T>) -> Self {
        if items.is_empty() {
            Related::Empty
        } else {
            Related::Populated(items)
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Related::Populated(items) => items,
            Related::NotFetched | Related::Empty => &[],
        }
    }

    pub fn is_fetched(&self) -> bool {
        !matches!(self, Related::NotFetched)
    }
}
