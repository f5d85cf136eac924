//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod kv;
pub mod payload;
mod remote;
pub mod telemetry;
pub mod webflow;
