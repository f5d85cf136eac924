//! Collection schemas and the option-id → label maps derived from them.

use std::collections::HashMap;

use fundhub_api_types::CollectionSchemaResponse;
use serde::{Deserialize, Serialize};

use crate::domain::error::SchemaError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub collection_id: String,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub slug: String,
    pub field_type: String,
    pub options: Option<Vec<EnumOption>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumOption {
    pub id: String,
    pub label: String,
}

impl From<CollectionSchemaResponse> for CollectionSchema {
    fn from(response: CollectionSchemaResponse) -> Self {
        let fields = response
            .fields
            .into_iter()
            .map(|field| FieldDescriptor {
                slug: field.slug,
                field_type: field.field_type,
                options: field.validations.and_then(|validations| {
                    validations.options.map(|options| {
                        options
                            .into_iter()
                            .map(|option| EnumOption {
                                id: option.id,
                                label: option.name,
                            })
                            .collect()
                    })
                }),
            })
            .collect();

        Self {
            collection_id: response.id,
            fields,
        }
    }
}

impl CollectionSchema {
    pub fn field(&self, slug: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.slug == slug)
    }

    /// Build the label map for one enumerated field.
    pub fn enum_labels(&self, slug: &str) -> Result<EnumLabelMap, SchemaError> {
        let field = self
            .field(slug)
            .ok_or_else(|| SchemaError::field_missing(&self.collection_id, slug))?;
        let options = field
            .options
            .as_ref()
            .ok_or_else(|| SchemaError::not_enumerable(&self.collection_id, slug))?;
        Ok(EnumLabelMap::from_options(options))
    }
}

/// Option id → trimmed label for a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumLabelMap(HashMap<String, String>);

impl EnumLabelMap {
    pub fn from_options(options: &[EnumOption]) -> Self {
        Self(
            options
                .iter()
                .map(|option| (option.id.clone(), option.label.trim().to_string()))
                .collect(),
        )
    }

    /// Label for `id`, echoing the id itself when it is unknown.
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).unwrap_or(id)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for EnumLabelMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(id, label)| (id, label.trim().to_string()))
                .collect(),
        )
    }
}
