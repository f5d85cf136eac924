//! Domain layer types and invariants.

pub mod classify;
pub mod entities;
pub mod error;
pub mod schema;
pub mod transform;
pub mod types;
