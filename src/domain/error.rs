use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("record `{record_id}` is missing required field `{field}`")]
    MissingField {
        record_id: String,
        field: &'static str,
    },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn missing_field(record_id: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            record_id: record_id.into(),
            field,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Preconditions on a collection schema that label resolution depends on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("field `{field}` not found in collection `{collection_id}`")]
    FieldMissing {
        collection_id: String,
        field: String,
    },
    #[error("field `{field}` in collection `{collection_id}` has no option list")]
    NotEnumerable {
        collection_id: String,
        field: String,
    },
}

impl SchemaError {
    pub fn field_missing(collection_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self::FieldMissing {
            collection_id: collection_id.into(),
            field: field.into(),
        }
    }

    pub fn not_enumerable(collection_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self::NotEnumerable {
            collection_id: collection_id.into(),
            field: field.into(),
        }
    }
}
