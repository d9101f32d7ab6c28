//! Conversion of JSON nodes into native maps

use crate::error::{Error, ErrorKind, Result};
use crate::types::JsonObject;
use serde_json::Value;

/// The node as an object
pub fn to_object(value: &Value) -> Result<JsonObject> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        other => Err(Error::with_message(
            ErrorKind::FailedToUnmarshalBody,
            format!("expected a JSON object, found {}", type_name(other)),
        )),
    }
}

/// Every element of an array as an object
pub fn to_objects(values: &[Value]) -> Result<Vec<JsonObject>> {
    values.iter().map(to_object).collect()
}

/// Unwrap `{"<key>": {...}}` envelopes around each element, leaving other elements as they are
pub fn unwrap_each(values: &[Value], key: &str) -> Result<Vec<JsonObject>> {
    values
        .iter()
        .map(|v| match v.get(key) {
            Some(inner @ Value::Object(_)) => to_object(inner),
            _ => to_object(v),
        })
        .collect()
}

/// Copy of `map` with all keys lowercased
pub fn lowercase_keys(map: &JsonObject) -> JsonObject {
    map.iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect()
}

/// Short JSON type name for messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
