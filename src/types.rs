//! Common types used throughout Solidafy Connectors
//!
//! The provider-neutral data model (objects, records, fields) plus the
//! parameter and result types of the four connector verbs.

use crate::error::{Error, ErrorKind, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

/// Identifier of an API surface within a provider
pub type ModuleId = String;

/// Module used by providers exposing a single API surface
pub const ROOT_MODULE: &str = "root";

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Provider-neutral value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    String,
    Int,
    Float,
    Boolean,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    SingleSelect,
    MultiSelect,
    #[default]
    Other,
}

/// One entry of an enumerated field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    pub value: String,
    pub display_value: String,
}

impl FieldValue {
    pub fn new(value: impl Into<String>, display_value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display_value: display_value.into(),
        }
    }
}

/// Full metadata of one field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    pub display_name: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub provider_type: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<FieldValue>>,
}

impl FieldMetadata {
    pub fn new(display_name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            display_name: display_name.into(),
            value_type,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_provider_type(mut self, provider_type: impl Into<String>) -> Self {
        self.provider_type = provider_type.into();
        self
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use]
    pub fn with_values(mut self, values: Vec<FieldValue>) -> Self {
        self.values = Some(values);
        self
    }
}

/// Fields of one object plus its display name.
///
/// `fields` and `fields_map` are kept in sync by the `add_*` helpers: a field
/// added with full metadata also appears in the lightweight map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub display_name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldMetadata>,
    #[serde(default)]
    pub fields_map: BTreeMap<String, String>,
}

impl ObjectMetadata {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    /// Add a field with full metadata
    pub fn add_field(&mut self, name: impl Into<String>, field: FieldMetadata) {
        let name = name.into();
        self.fields_map
            .insert(name.clone(), field.display_name.clone());
        self.fields.insert(name, field);
    }

    /// Add a field known only by name
    pub fn add_field_name(&mut self, name: impl Into<String>, display_name: impl Into<String>) {
        self.fields_map.insert(name.into(), display_name.into());
    }

    /// Whether the rich and lightweight views describe the same fields
    pub fn is_consistent(&self) -> bool {
        self.fields.is_empty() || self.fields.keys().eq(self.fields_map.keys())
    }
}

/// Result of ListObjectMetadata: per-object metadata and per-object errors
#[derive(Debug, Default, Serialize)]
pub struct ListObjectMetadataResult {
    pub result: BTreeMap<String, ObjectMetadata>,
    #[serde(serialize_with = "serialize_errors")]
    pub errors: BTreeMap<String, Error>,
}

impl ListObjectMetadataResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, object: impl Into<String>, metadata: ObjectMetadata) {
        self.result.insert(object.into(), metadata);
    }

    pub fn add_error(&mut self, object: impl Into<String>, error: Error) {
        self.errors.insert(object.into(), error);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ListObjectMetadataResult) {
        self.result.extend(other.result);
        self.errors.extend(other.errors);
    }
}

fn serialize_errors<S: Serializer>(
    errors: &BTreeMap<String, Error>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(errors.iter().map(|(k, v)| (k, v.to_string())))
}

// ============================================================================
// Read
// ============================================================================

/// Fields requested by a read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    /// Every field the provider returns
    All,
    /// Named subset, matched case-insensitively
    Named(BTreeSet<String>),
}

impl FieldSelection {
    pub fn named<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Named(fields.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Named(set) if set.is_empty())
    }

    /// Whether `field` was requested, compared under [`fold_field_name`]
    pub fn contains(&self, field: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(set) => {
                let folded = fold_field_name(field);
                set.iter().any(|f| fold_field_name(f) == folded)
            }
        }
    }
}

/// Case folding shared by field selection and projected row keys
pub fn fold_field_name(name: &str) -> String {
    name.to_lowercase()
}

/// Parameters of a Read call
#[derive(Debug, Clone)]
pub struct ReadParams {
    pub object_name: String,
    pub fields: FieldSelection,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Opaque cursor returned by a previous read
    pub next_page: Option<String>,
    pub page_size: Option<u32>,
    /// Provider-specific filter expression passed through verbatim
    pub filter: Option<String>,
}

impl ReadParams {
    pub fn new(object_name: impl Into<String>, fields: FieldSelection) -> Self {
        Self {
            object_name: object_name.into(),
            fields,
            since: None,
            until: None,
            next_page: None,
            page_size: None,
            filter: None,
        }
    }

    #[must_use]
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    #[must_use]
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    #[must_use]
    pub fn next_page(mut self, next_page: impl Into<String>) -> Self {
        self.next_page = next_page.into().none_if_empty();
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Whether a time window was requested
    pub fn has_time_window(&self) -> bool {
        self.since.is_some() || self.until.is_some()
    }

    /// Check required inputs
    pub fn validate(&self) -> Result<()> {
        if self.object_name.is_empty() {
            return Err(ErrorKind::MissingObjects.into());
        }
        if self.fields.is_empty() {
            return Err(ErrorKind::MissingFields.into());
        }
        Ok(())
    }
}

/// One record returned by Read
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReadResultRow {
    /// Requested fields, keys lowercased
    pub fields: JsonObject,
    /// The complete record as returned by the provider
    pub raw: JsonObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Result of a Read call
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResult {
    pub rows: usize,
    pub data: Vec<ReadResultRow>,
    pub next_page: Option<String>,
    pub done: bool,
}

impl ReadResult {
    /// `done` is derived from the cursor: an absent or empty cursor means done.
    pub fn new(data: Vec<ReadResultRow>, next_page: Option<String>) -> Self {
        let next_page = next_page.none_if_empty();
        Self {
            rows: data.len(),
            done: next_page.is_none(),
            data,
            next_page,
        }
    }
}

// ============================================================================
// Write / Delete
// ============================================================================

/// Payload of a write
#[derive(Debug, Clone, PartialEq)]
pub enum RecordData {
    Json(JsonObject),
    Bytes(Bytes),
}

impl RecordData {
    pub fn is_empty(&self) -> bool {
        match self {
            RecordData::Json(map) => map.is_empty(),
            RecordData::Bytes(bytes) => bytes.is_empty(),
        }
    }

    /// The payload as a JSON object, parsing raw bytes when needed
    pub fn to_object(&self) -> Result<JsonObject> {
        match self {
            RecordData::Json(map) => Ok(map.clone()),
            RecordData::Bytes(bytes) => match serde_json::from_slice(bytes)? {
                JsonValue::Object(map) => Ok(map),
                _ => Err(Error::with_message(
                    ErrorKind::MissingRecordData,
                    "record data must be a JSON object",
                )),
            },
        }
    }
}

impl From<JsonObject> for RecordData {
    fn from(map: JsonObject) -> Self {
        RecordData::Json(map)
    }
}

/// Parameters of a Write call
#[derive(Debug, Clone)]
pub struct WriteParams {
    pub object_name: String,
    /// Empty for create, set for update
    pub record_id: Option<String>,
    pub record_data: RecordData,
}

impl WriteParams {
    pub fn create(object_name: impl Into<String>, record_data: impl Into<RecordData>) -> Self {
        Self {
            object_name: object_name.into(),
            record_id: None,
            record_data: record_data.into(),
        }
    }

    pub fn update(
        object_name: impl Into<String>,
        record_id: impl Into<String>,
        record_data: impl Into<RecordData>,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            record_id: Some(record_id.into()),
            record_data: record_data.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.object_name.is_empty() {
            return Err(ErrorKind::MissingObjects.into());
        }
        if matches!(&self.record_id, Some(id) if id.is_empty()) {
            return Err(ErrorKind::MissingRecordId.into());
        }
        if self.record_data.is_empty() {
            return Err(ErrorKind::MissingRecordData.into());
        }
        Ok(())
    }
}

/// Result of a Write call
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    pub success: bool,
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JsonValue>,
    pub data: Option<JsonObject>,
}

impl WriteResult {
    pub fn success(record_id: Option<String>, data: Option<JsonObject>) -> Self {
        Self {
            success: true,
            record_id: record_id.none_if_empty(),
            errors: Vec::new(),
            data,
        }
    }
}

/// Parameters of a Delete call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteParams {
    pub object_name: String,
    pub record_id: String,
}

impl DeleteParams {
    pub fn new(object_name: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            record_id: record_id.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.object_name.is_empty() {
            return Err(ErrorKind::MissingObjects.into());
        }
        if self.record_id.is_empty() {
            return Err(ErrorKind::MissingRecordId.into());
        }
        Ok(())
    }
}

/// Result of a Delete call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeleteResult {
    pub success: bool,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_conversion() {
        let get: reqwest::Method = Method::GET.into();
        assert_eq!(reqwest::Method::GET, get);
        let patch: reqwest::Method = Method::PATCH.into();
        assert_eq!(reqwest::Method::PATCH, patch);
    }

    #[test]
    fn test_value_type_serde() {
        let vt: ValueType = serde_json::from_str("\"singleSelect\"").unwrap();
        assert_eq!(vt, ValueType::SingleSelect);
        assert_eq!(serde_json::to_string(&ValueType::DateTime).unwrap(), "\"datetime\"");
        assert_eq!(serde_json::to_string(&ValueType::Int).unwrap(), "\"int\"");
    }

    #[test]
    fn test_object_metadata_keys_agree() {
        let mut meta = ObjectMetadata::new("Contacts");
        meta.add_field("id", FieldMetadata::new("ID", ValueType::Int).read_only());
        meta.add_field("email", FieldMetadata::new("Email", ValueType::String));

        assert!(meta.is_consistent());
        assert_eq!(meta.fields_map.get("email"), Some(&"Email".to_string()));
    }

    #[test]
    fn test_read_result_done_follows_cursor() {
        let done = ReadResult::new(vec![ReadResultRow::default()], Some(String::new()));
        assert!(done.done);
        assert_eq!(done.next_page, None);
        assert_eq!(done.rows, 1);

        let more = ReadResult::new(vec![], Some("abc".to_string()));
        assert!(!more.done);
        assert_eq!(more.next_page.as_deref(), Some("abc"));
    }

    #[test]
    fn test_read_params_validation() {
        let err = ReadParams::new("", FieldSelection::All).validate().unwrap_err();
        assert!(err.is(ErrorKind::MissingObjects));

        let err = ReadParams::new("contacts", FieldSelection::named(Vec::<String>::new()))
            .validate()
            .unwrap_err();
        assert!(err.is(ErrorKind::MissingFields));

        assert!(ReadParams::new("contacts", FieldSelection::All)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_field_selection_case_insensitive() {
        let fields = FieldSelection::named(["Email", "id"]);
        assert!(fields.contains("email"));
        assert!(fields.contains("ID"));
        assert!(!fields.contains("name"));
        assert!(FieldSelection::All.contains("anything"));
    }

    #[test]
    fn test_field_selection_folds_non_ascii() {
        let fields = FieldSelection::named(["Ärger", "ÉTAT"]);
        assert!(fields.contains("ärger"));
        assert!(fields.contains("état"));
        assert!(!fields.contains("arger"));
    }

    #[test]
    fn test_write_params_validation() {
        let empty = WriteParams::create("contacts", JsonObject::new());
        assert!(empty.validate().unwrap_err().is(ErrorKind::MissingRecordData));

        let data = json!({"name": "Ada"}).as_object().cloned().unwrap();
        let update = WriteParams::update("contacts", "", data);
        assert!(update.validate().unwrap_err().is(ErrorKind::MissingRecordId));
    }

    #[test]
    fn test_record_data_from_bytes() {
        let data = RecordData::Bytes(Bytes::from_static(br#"{"name":"Ada"}"#));
        assert_eq!(data.to_object().unwrap()["name"], "Ada");

        let not_object = RecordData::Bytes(Bytes::from_static(b"[1,2]"));
        assert!(not_object.to_object().is_err());
    }

    #[test]
    fn test_delete_params_validation() {
        let err = DeleteParams::new("contacts", "").validate().unwrap_err();
        assert!(err.is(ErrorKind::MissingRecordId));
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
        assert_eq!(String::new().none_if_empty(), None);
    }
}
