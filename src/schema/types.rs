//! Static schema catalog types
//!
//! The on-disk shape of a provider's compiled-in catalog:
//! `modules → objects → fields`.

use crate::pagination::PaginationKind;
use crate::types::{FieldMetadata, ModuleId, ObjectMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every module of one provider
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaCatalog {
    #[serde(default)]
    pub modules: BTreeMap<ModuleId, ModuleSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a module, keyed by its id
    pub fn add_module(&mut self, module: ModuleSchema) {
        self.modules.insert(module.id.clone(), module);
    }

    /// Convert to pretty JSON string
    pub fn to_json_pretty(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Objects of one API surface
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleSchema {
    pub id: ModuleId,
    /// Path prefix shared by every object (`/v1`)
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectSchema>,
}

impl ModuleSchema {
    pub fn new(id: impl Into<ModuleId>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            objects: BTreeMap::new(),
        }
    }
}

/// One object as generated from an OpenAPI list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    pub display_name: String,
    /// Path relative to the module path
    pub path: String,
    /// Key of the record array in list responses, empty when the body is the array
    #[serde(default)]
    pub response_key: String,
    #[serde(default)]
    pub incremental_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size_param: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationKind>,
    #[serde(default)]
    pub fields: FieldSet,
}

/// Fields of a catalog object
///
/// Older catalogs list names only; newer ones carry per-field metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSet {
    Rich(BTreeMap<String, FieldMetadata>),
    Names(Vec<String>),
}

impl Default for FieldSet {
    fn default() -> Self {
        FieldSet::Names(Vec::new())
    }
}

impl FieldSet {
    pub fn len(&self) -> usize {
        match self {
            FieldSet::Rich(fields) => fields.len(),
            FieldSet::Names(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectSchema {
    /// Provider-neutral metadata for this object
    pub fn to_metadata(&self) -> ObjectMetadata {
        let mut metadata = ObjectMetadata::new(self.display_name.clone());
        match &self.fields {
            FieldSet::Rich(fields) => {
                for (name, field) in fields {
                    metadata.add_field(name.clone(), field.clone());
                }
            }
            FieldSet::Names(names) => {
                for name in names {
                    metadata.add_field_name(name.clone(), name.clone());
                }
            }
        }
        metadata
    }
}
