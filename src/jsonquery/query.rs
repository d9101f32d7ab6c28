//! Typed navigation over parsed JSON bodies

use crate::error::{Error, Result};
use crate::types::JsonObject;
use serde_json::Value;

/// Cursor over a JSON node, optionally zoomed into a nested object
#[derive(Debug, Clone)]
pub struct JsonQuery<'a> {
    node: &'a Value,
    zoom: Vec<String>,
}

impl<'a> JsonQuery<'a> {
    pub fn new(node: &'a Value) -> Self {
        Self {
            node,
            zoom: Vec::new(),
        }
    }

    /// Navigate into nested objects before reading keys
    #[must_use]
    pub fn zoom(mut self, path: &[&str]) -> Self {
        self.zoom.extend(path.iter().map(|p| (*p).to_string()));
        self
    }

    fn path_of(&self, key: &str) -> String {
        if self.zoom.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.zoom.join("."))
        }
    }

    /// The zoomed object, `None` when a zoom segment is absent
    fn object(&self) -> Result<Option<&'a JsonObject>> {
        let mut current = self.node;
        for (depth, segment) in self.zoom.iter().enumerate() {
            let Value::Object(map) = current else {
                return Err(Error::UnexpectedType {
                    key: self.zoom[..depth].join("."),
                    expected: "object",
                });
            };
            match map.get(segment) {
                Some(Value::Null) | None => return Ok(None),
                Some(next) => current = next,
            }
        }

        match current {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(Error::UnexpectedType {
                key: self.zoom.join("."),
                expected: "object",
            }),
        }
    }

    /// Raw value at `key`; JSON `null` reads as absent
    pub fn value_optional(&self, key: &str) -> Result<Option<&'a Value>> {
        Ok(self
            .object()?
            .and_then(|map| map.get(key))
            .filter(|v| !v.is_null()))
    }

    fn value_required(&self, key: &str) -> Result<&'a Value> {
        self.value_optional(key)?
            .ok_or_else(|| Error::key_not_found(self.path_of(key)))
    }

    pub fn array_required(&self, key: &str) -> Result<&'a Vec<Value>> {
        let value = self.value_required(key)?;
        value.as_array().ok_or_else(|| Error::NotArray {
            key: self.path_of(key),
        })
    }

    pub fn array_optional(&self, key: &str) -> Result<Option<&'a Vec<Value>>> {
        match self.value_optional(key)? {
            None => Ok(None),
            Some(Value::Array(arr)) => Ok(Some(arr)),
            Some(_) => Err(Error::NotArray {
                key: self.path_of(key),
            }),
        }
    }

    pub fn object_required(&self, key: &str) -> Result<&'a JsonObject> {
        self.object_optional(key)?
            .ok_or_else(|| Error::key_not_found(self.path_of(key)))
    }

    pub fn object_optional(&self, key: &str) -> Result<Option<&'a JsonObject>> {
        match self.value_optional(key)? {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(self.unexpected(key, "object")),
        }
    }

    pub fn string_required(&self, key: &str) -> Result<&'a str> {
        self.string_optional(key)?
            .ok_or_else(|| Error::key_not_found(self.path_of(key)))
    }

    pub fn string_optional(&self, key: &str) -> Result<Option<&'a str>> {
        match self.value_optional(key)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(self.unexpected(key, "string")),
        }
    }

    pub fn integer_required(&self, key: &str) -> Result<i64> {
        self.integer_optional(key)?
            .ok_or_else(|| Error::key_not_found(self.path_of(key)))
    }

    /// Integer at `key`; floats without a fractional part are accepted
    pub fn integer_optional(&self, key: &str) -> Result<Option<i64>> {
        match self.value_optional(key)? {
            None => Ok(None),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Some(i));
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
                    _ => Err(self.unexpected(key, "integer")),
                }
            }
            Some(_) => Err(self.unexpected(key, "integer")),
        }
    }

    pub fn bool_optional(&self, key: &str) -> Result<Option<bool>> {
        match self.value_optional(key)? {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.unexpected(key, "boolean")),
        }
    }

    pub fn str_with_default(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .string_optional(key)?
            .map_or_else(|| default.to_string(), ToString::to_string))
    }

    fn unexpected(&self, key: &str, expected: &'static str) -> Error {
        Error::UnexpectedType {
            key: self.path_of(key),
            expected,
        }
    }
}

/// Extract a scalar from JSON using a simple dotted path
/// Supports paths like "$.data.token" or "data.token"
pub fn extract_text(value: &Value, path: &str) -> Option<String> {
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            _ => return None,
        }
    }

    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Evaluate a JSONPath expression, flattening the matches
pub fn select(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::JsonPath {
        message: format!("Invalid JSONPath '{path}': {e}"),
    })?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}
