//! Application services: cached reads over the remote collection store.

pub mod contributors;
pub mod error;
pub mod labels;
pub mod pagination;
pub mod projects;
pub mod related;
pub mod sources;
pub mod stats;
