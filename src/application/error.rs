use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{labels::LabelError, sources::RemoteError},
    domain::error::{DomainError, SchemaError},
    infra::error::InfraError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Labels(#[from] LabelError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// True when the remote store throttled the request.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AppError::Remote(RemoteError::RateLimited))
            || matches!(self, AppError::Labels(LabelError::Remote(RemoteError::RateLimited)))
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::Labels(LabelError::Schema(err))
    }
}

/// Messages of `error` and every source below it, outermost first.
pub fn error_chain(error: &dyn StdError) -> Vec<String> {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(inner) = current {
        messages.push(inner.to_string());
        current = inner.source();
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_surface_through_labels() {
        let err = AppError::from(SchemaError::field_missing("projects", "status"));
        assert!(matches!(err, AppError::Labels(LabelError::Schema(_))));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn rate_limit_is_detected_at_any_depth() {
        assert!(AppError::from(RemoteError::RateLimited).is_rate_limited());
        assert!(AppError::from(LabelError::Remote(RemoteError::RateLimited)).is_rate_limited());
    }

    #[test]
    fn chain_starts_with_outer_message() {
        let err = AppError::from(InfraError::configuration("missing base url"));
        let chain = error_chain(&err);
        assert_eq!(chain[0], err.to_string());
    }
}
