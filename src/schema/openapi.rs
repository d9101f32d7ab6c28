//! Static catalog generation from OpenAPI 3 documents
//!
//! Every `GET` path without path parameters whose success response carries a
//! JSON array of records becomes one catalog object. Local `$ref`s are
//! resolved and `allOf` compositions are merged before fields are read.

use super::inference::display_name;
use super::types::{FieldSet, ModuleSchema, ObjectSchema};
use crate::error::{Error, Result};
use crate::types::{FieldMetadata, FieldValue, JsonObject, JsonValue, ValueType};
use std::collections::BTreeMap;
use tracing::debug;

/// Keys commonly wrapping the record array of a list response
pub const ARRAY_KEYS: &[&str] = &["data", "results", "list", "value", "items"];

/// Query parameters that carry a page size
pub const PAGE_SIZE_PARAMS: &[&str] = &[
    "limit",
    "per_page",
    "perPage",
    "page_size",
    "pageSize",
    "page[size]",
    "max",
    "count",
];

/// Query parameters that narrow a listing by time
pub const SINCE_PARAMS: &[&str] = &[
    "since",
    "updated_since",
    "modified_since",
    "updated_at_start",
    "created_after",
    "from",
];

const MAX_REF_DEPTH: usize = 32;

/// Walks an OpenAPI document and produces a catalog module
#[derive(Debug, Clone)]
pub struct OpenApiExtractor {
    doc: JsonValue,
}

impl OpenApiExtractor {
    pub fn new(doc: JsonValue) -> Self {
        Self { doc }
    }

    /// Parse a JSON or YAML document
    pub fn parse(raw: &str) -> Result<Self> {
        let doc: JsonValue = serde_yaml::from_str(raw)?;
        if doc.get("openapi").and_then(JsonValue::as_str).is_none() {
            return Err(Error::schema("document is not OpenAPI 3 (missing 'openapi')"));
        }
        Ok(Self::new(doc))
    }

    /// Extract every list endpoint below `module_path`
    pub fn extract(&self, module_id: &str, module_path: &str) -> Result<ModuleSchema> {
        let paths = self
            .doc
            .get("paths")
            .and_then(JsonValue::as_object)
            .ok_or_else(|| Error::schema("document has no 'paths'"))?;

        let prefix = module_path.trim_end_matches('/');
        let mut module = ModuleSchema::new(module_id, prefix);

        for (path, item) in paths {
            if path.contains('{') {
                continue;
            }
            let Some(relative) = path.strip_prefix(prefix) else {
                continue;
            };
            let Some(op) = item.get("get") else {
                continue;
            };

            let object_name = relative.trim_matches('/').to_string();
            if object_name.is_empty() {
                continue;
            }

            match self.extract_object(&object_name, relative, item, op)? {
                Some(schema) => {
                    debug!(object = %object_name, fields = schema.fields.len(), "Extracted object");
                    module.objects.insert(object_name, schema);
                }
                None => debug!(path = %path, "Skipping path without a record array"),
            }
        }

        Ok(module)
    }

    fn extract_object(
        &self,
        object_name: &str,
        path: &str,
        item: &JsonValue,
        op: &JsonValue,
    ) -> Result<Option<ObjectSchema>> {
        let Some(response) = self.response_schema(op)? else {
            return Ok(None);
        };
        let Some((response_key, record)) = self.locate_array(object_name, &response)? else {
            return Ok(None);
        };

        let params = self.parameter_names(item, op)?;
        let page_size_param = PAGE_SIZE_PARAMS
            .iter()
            .find(|p| params.iter().any(|name| name == *p))
            .map(|p| (*p).to_string());
        let incremental_read = SINCE_PARAMS
            .iter()
            .any(|p| params.iter().any(|name| name == p));

        let mut fields = BTreeMap::new();
        for (name, property) in self.properties(&record)? {
            let property = self.resolve(&property)?;
            fields.insert(name.clone(), self.field_metadata(&name, &property)?);
        }

        Ok(Some(ObjectSchema {
            display_name: display_name(object_name),
            path: format!("/{}", path.trim_matches('/')),
            response_key,
            incremental_read,
            page_size_param,
            pagination: None,
            fields: FieldSet::Rich(fields),
        }))
    }

    /// Schema of the 200 `application/json` response, refs resolved
    fn response_schema(&self, op: &JsonValue) -> Result<Option<JsonValue>> {
        let schema = op
            .get("responses")
            .and_then(|r| r.get("200"))
            .map(|r| self.resolve(r))
            .transpose()?
            .and_then(|r| {
                r.get("content")
                    .and_then(|c| c.get("application/json"))
                    .and_then(|c| c.get("schema"))
                    .cloned()
            });
        schema.map(|s| self.resolve(&s)).transpose()
    }

    /// Response key and item schema of the record array
    fn locate_array(
        &self,
        object_name: &str,
        response: &JsonValue,
    ) -> Result<Option<(String, JsonValue)>> {
        if let Some(items) = self.array_items(response)? {
            return Ok(Some((String::new(), items)));
        }

        let properties = self.properties(response)?;
        let leaf = object_name.rsplit('/').next().unwrap_or(object_name);
        for key in ARRAY_KEYS.iter().copied().chain([leaf]) {
            let Some(property) = properties.get(key) else {
                continue;
            };
            if let Some(items) = self.array_items(&self.resolve(property)?)? {
                return Ok(Some((key.to_string(), items)));
            }
        }
        Ok(None)
    }

    fn array_items(&self, schema: &JsonValue) -> Result<Option<JsonValue>> {
        if schema.get("type").and_then(JsonValue::as_str) != Some("array") {
            return Ok(None);
        }
        schema
            .get("items")
            .map(|items| self.resolve(items))
            .transpose()
    }

    /// Properties of an object schema with `allOf` members merged in order
    fn properties(&self, schema: &JsonValue) -> Result<JsonObject> {
        let mut merged = JsonObject::new();
        merge_properties(&mut merged, schema.get("properties"));

        if let Some(members) = schema.get("allOf").and_then(JsonValue::as_array) {
            for member in members {
                let member = self.resolve(member)?;
                for (name, property) in self.properties(&member)? {
                    merged.entry(name).or_insert(property);
                }
            }
        }
        Ok(merged)
    }

    fn parameter_names(&self, item: &JsonValue, op: &JsonValue) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for source in [item, op] {
            let Some(params) = source.get("parameters").and_then(JsonValue::as_array) else {
                continue;
            };
            for param in params {
                let param = self.resolve(param)?;
                if param.get("in").and_then(JsonValue::as_str) != Some("query") {
                    continue;
                }
                if let Some(name) = param.get("name").and_then(JsonValue::as_str) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    fn field_metadata(&self, name: &str, property: &JsonValue) -> Result<FieldMetadata> {
        let schema_type = property.get("type").and_then(JsonValue::as_str).unwrap_or("");
        let format = property.get("format").and_then(JsonValue::as_str);

        let provider_type = match format {
            Some(format) if !schema_type.is_empty() => format!("{schema_type}/{format}"),
            _ => schema_type.to_string(),
        };

        let item_enum = match schema_type {
            "array" => property
                .get("items")
                .map(|items| self.resolve(items))
                .transpose()?
                .and_then(|items| items.get("enum").cloned()),
            _ => None,
        };
        let own_enum = property.get("enum").cloned();

        let value_type = match (schema_type, format) {
            (_, Some("date-time")) => ValueType::DateTime,
            (_, Some("date")) => ValueType::Date,
            ("integer", _) => ValueType::Int,
            ("number", _) => ValueType::Float,
            ("boolean", _) => ValueType::Boolean,
            ("string", _) if own_enum.is_some() => ValueType::SingleSelect,
            ("array", _) if item_enum.is_some() => ValueType::MultiSelect,
            ("string", _) => ValueType::String,
            _ => ValueType::Other,
        };

        let display = property
            .get("title")
            .and_then(JsonValue::as_str)
            .unwrap_or(name);
        let mut field = FieldMetadata::new(display, value_type).with_provider_type(provider_type);

        if let Some(values) = own_enum.or(item_enum).as_ref().and_then(JsonValue::as_array) {
            field = field.with_values(
                values
                    .iter()
                    .filter_map(|v| match v {
                        JsonValue::String(s) => Some(s.clone()),
                        JsonValue::Null => None,
                        other => Some(other.to_string()),
                    })
                    .map(|v| FieldValue::new(v.clone(), v))
                    .collect(),
            );
        }
        if property.get("readOnly").and_then(JsonValue::as_bool) == Some(true) {
            field = field.read_only();
        }
        Ok(field)
    }

    /// Follow `$ref` chains to the referenced node
    fn resolve(&self, node: &JsonValue) -> Result<JsonValue> {
        let mut current = node;
        for _ in 0..MAX_REF_DEPTH {
            let Some(reference) = current.get("$ref").and_then(JsonValue::as_str) else {
                return Ok(current.clone());
            };
            current = resolve_local_ref(&self.doc, reference)?;
        }
        Err(Error::schema("reference chain too deep"))
    }
}

fn resolve_local_ref<'a>(root: &'a JsonValue, reference: &str) -> Result<&'a JsonValue> {
    let Some(pointer) = reference.strip_prefix('#') else {
        return Err(Error::schema(format!("unsupported external reference '{reference}'")));
    };
    root.pointer(pointer)
        .ok_or_else(|| Error::schema(format!("unresolved reference '{reference}'")))
}

/// Merges property maps, preserving existing values.
fn merge_properties(into: &mut JsonObject, from: Option<&JsonValue>) {
    if let Some(map) = from.and_then(JsonValue::as_object) {
        for (k, v) in map {
            into.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}
