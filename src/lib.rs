//! Read-through cache and classification engine for project records kept in
//! a headless collection store.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
