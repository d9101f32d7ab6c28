//! Field metadata inference from sampled records

use crate::types::{FieldMetadata, JsonValue, ObjectMetadata, ValueType};
use heck::ToTitleCase;
use regex::Regex;
use std::sync::LazyLock;

static DATETIME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}").ok());

static DATE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok());

/// Infers an object's fields from the dynamic types of sample values
#[derive(Debug, Clone, Default)]
pub struct MetadataInferrer {
    /// Detect ISO-8601 date and date-time strings
    detect_datetime: bool,
}

impl MetadataInferrer {
    /// Inferrer mapping JSON types only: string, number, bool, everything else `other`
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable/disable datetime detection
    #[must_use]
    pub fn with_datetime_detection(mut self, enabled: bool) -> Self {
        self.detect_datetime = enabled;
        self
    }

    /// Metadata from a single record
    pub fn infer(&self, object_name: &str, record: &JsonValue) -> ObjectMetadata {
        self.infer_from_records(object_name, std::slice::from_ref(record))
    }

    /// Metadata from several records; a field seen in any record is kept
    pub fn infer_from_records(&self, object_name: &str, records: &[JsonValue]) -> ObjectMetadata {
        let mut metadata = ObjectMetadata::new(display_name(object_name));

        for record in records {
            let JsonValue::Object(map) = record else {
                continue;
            };
            for (key, value) in map {
                // A typed sample replaces one inferred from null
                let known = metadata
                    .fields
                    .get(key)
                    .is_some_and(|existing| existing.provider_type != "null");
                if !known {
                    metadata.add_field(key.clone(), self.infer_field(key, value));
                }
            }
        }

        metadata
    }

    fn infer_field(&self, name: &str, value: &JsonValue) -> FieldMetadata {
        let (value_type, provider_type) = match value {
            JsonValue::String(s) => (self.infer_string(s), "string"),
            JsonValue::Number(_) => (ValueType::Float, "number"),
            JsonValue::Bool(_) => (ValueType::Boolean, "boolean"),
            JsonValue::Array(_) => (ValueType::Other, "array"),
            JsonValue::Object(_) => (ValueType::Other, "object"),
            JsonValue::Null => (ValueType::Other, "null"),
        };
        FieldMetadata::new(name, value_type).with_provider_type(provider_type)
    }

    fn infer_string(&self, s: &str) -> ValueType {
        if !self.detect_datetime {
            return ValueType::String;
        }
        if matches_pattern(&DATETIME, s) {
            ValueType::DateTime
        } else if matches_pattern(&DATE, s) {
            ValueType::Date
        } else {
            ValueType::String
        }
    }
}

fn matches_pattern(pattern: &LazyLock<Option<Regex>>, s: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(s))
}

/// Human label for an object name: `custom-events` → `Custom Events`
pub fn display_name(object_name: &str) -> String {
    object_name.to_title_case()
}
