//! Immutable in-memory catalog lookups

use super::types::{ObjectSchema, SchemaCatalog};
use crate::error::{Error, ErrorKind, Result};
use crate::pagination::PaginationKind;
use crate::types::ListObjectMetadataResult;
use std::collections::BTreeSet;

/// Read-only view over a provider's static catalog
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaStore {
    catalog: SchemaCatalog,
}

impl StaticSchemaStore {
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self { catalog }
    }

    /// Parse an embedded catalog document
    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog: SchemaCatalog = serde_json::from_str(raw)?;
        for (key, module) in &catalog.modules {
            if *key != module.id {
                return Err(Error::schema(format!(
                    "module key '{key}' does not match its id '{}'",
                    module.id
                )));
            }
        }
        Ok(Self::new(catalog))
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    fn object(&self, module: &str, object: &str) -> Result<&ObjectSchema> {
        self.catalog
            .modules
            .get(module)
            .and_then(|m| m.objects.get(object))
            .ok_or_else(|| {
                Error::with_message(
                    ErrorKind::ObjectNotSupported,
                    format!("object '{object}' not found in module '{module}'"),
                )
            })
    }

    /// Full URL path of an object: module path followed by object path
    pub fn lookup_url_path(&self, module: &str, object: &str) -> Result<String> {
        let module_schema = self.catalog.modules.get(module);
        let Some(schema) = module_schema.and_then(|m| m.objects.get(object)) else {
            return Err(Error::with_message(
                ErrorKind::ResolvingUrlPathForObject,
                object.to_string(),
            ));
        };

        let prefix = module_schema
            .map(|m| m.path.trim_end_matches('/'))
            .unwrap_or_default();
        Ok(format!("{prefix}/{}", schema.path.trim_start_matches('/')))
    }

    /// Key of the record array in list responses
    pub fn lookup_array_field_name(&self, module: &str, object: &str) -> Result<&str> {
        Ok(self.object(module, object)?.response_key.as_str())
    }

    /// Metadata for the named objects; unknown objects land in `errors`
    pub fn select(&self, module: &str, objects: &[String]) -> Result<ListObjectMetadataResult> {
        if objects.is_empty() {
            return Err(ErrorKind::MissingObjects.into());
        }

        let mut result = ListObjectMetadataResult::new();
        for name in objects {
            match self.object(module, name) {
                Ok(schema) => result.add_result(name.clone(), schema.to_metadata()),
                Err(e) => result.add_error(name.clone(), e),
            }
        }
        Ok(result)
    }

    /// Names of every object in a module
    pub fn object_names(&self, module: &str) -> BTreeSet<String> {
        self.catalog
            .modules
            .get(module)
            .map(|m| m.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_incremental_read(&self, module: &str, object: &str) -> bool {
        self.object(module, object)
            .is_ok_and(|schema| schema.incremental_read)
    }

    /// Query parameter carrying the page size, if the object has one
    pub fn lookup_page_size_param(&self, module: &str, object: &str) -> Option<&str> {
        self.object(module, object)
            .ok()
            .and_then(|schema| schema.page_size_param.as_deref())
    }

    pub fn lookup_pagination_type(&self, module: &str, object: &str) -> PaginationKind {
        self.object(module, object)
            .ok()
            .and_then(|schema| schema.pagination)
            .unwrap_or_default()
    }
}
