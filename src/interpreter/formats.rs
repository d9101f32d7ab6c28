//! Error body templates
//!
//! A `FormatSwitch` holds templates ordered by specificity. A template
//! matches when every one of its keys is present at the top level of the
//! body; the body is then deserialized into the template's descriptor type.
//! A body that fails to deserialize moves on to the next template.

use crate::types::JsonValue;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A typed error envelope that can produce a human message
pub trait ErrorDescriptor {
    fn message(&self) -> String;
}

type Describe = Box<dyn Fn(&JsonValue) -> Option<String> + Send + Sync>;

/// One error body shape
pub struct Template {
    keys: Vec<String>,
    describe: Describe,
}

impl Template {
    /// Template matching bodies with all `keys`, decoded as `T`
    pub fn new<T>(keys: &[&str]) -> Self
    where
        T: ErrorDescriptor + DeserializeOwned + 'static,
    {
        Self {
            keys: keys.iter().map(|k| (*k).to_string()).collect(),
            describe: Box::new(|body| {
                T::deserialize(body)
                    .ok()
                    .map(|descriptor| descriptor.message())
            }),
        }
    }

    fn matches(&self, body: &JsonValue) -> bool {
        body.as_object()
            .is_some_and(|map| self.keys.iter().all(|k| map.contains_key(k)))
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template").field("keys", &self.keys).finish()
    }
}

/// Ordered set of templates; more required keys win, ties keep insertion order
#[derive(Debug, Default)]
pub struct FormatSwitch {
    templates: Vec<Template>,
}

impl FormatSwitch {
    pub fn new(templates: Vec<Template>) -> Self {
        let mut switch = Self { templates };
        switch.sort();
        switch
    }

    /// Add a template, keeping precedence order
    #[must_use]
    pub fn with(mut self, template: Template) -> Self {
        self.templates.push(template);
        self.sort();
        self
    }

    fn sort(&mut self) {
        self.templates
            .sort_by(|a, b| b.keys.len().cmp(&a.keys.len()));
    }

    /// Message of the first template that matches and decodes
    pub fn describe(&self, body: &JsonValue) -> Option<String> {
        self.templates
            .iter()
            .filter(|t| t.matches(body))
            .find_map(|t| (t.describe)(body))
    }

    /// Templates for the envelopes most REST APIs use
    pub fn default_json() -> Self {
        Self::new(vec![
            Template::new::<OAuthError>(&["error", "error_description"]),
            Template::new::<MessageError>(&["message"]),
            Template::new::<StringError>(&["error"]),
            Template::new::<NestedError>(&["error"]),
            Template::new::<ErrorList>(&["errors"]),
        ])
    }

    /// Templates for XML envelopes after conversion to JSON
    pub fn default_xml() -> Self {
        Self::new(vec![
            Template::new::<NestedError>(&["error"]),
            Template::new::<PascalError>(&["Error"]),
        ])
    }
}

// ============================================================================
// Common Envelopes
// ============================================================================

/// `{"message": "..."}`
#[derive(Debug, Deserialize)]
pub struct MessageError {
    pub message: String,
}

impl ErrorDescriptor for MessageError {
    fn message(&self) -> String {
        self.message.clone()
    }
}

/// `{"error": "..."}`
#[derive(Debug, Deserialize)]
pub struct StringError {
    pub error: String,
}

impl ErrorDescriptor for StringError {
    fn message(&self) -> String {
        self.error.clone()
    }
}

/// `{"error": "invalid_grant", "error_description": "..."}`
#[derive(Debug, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: String,
}

impl ErrorDescriptor for OAuthError {
    fn message(&self) -> String {
        format!("{}: {}", self.error, self.error_description)
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<JsonValue>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorDetail {
    fn describe(&self) -> String {
        match (&self.message, &self.code) {
            (Some(m), _) => m.clone(),
            (None, Some(JsonValue::String(c))) => c.clone(),
            (None, Some(c)) => c.to_string(),
            (None, None) => String::new(),
        }
    }
}

/// `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Deserialize)]
pub struct NestedError {
    pub error: ErrorDetail,
}

impl ErrorDescriptor for NestedError {
    fn message(&self) -> String {
        self.error.describe()
    }
}

/// `{"Error": {"Code": "...", "Message": "..."}}`
#[derive(Debug, Deserialize)]
pub struct PascalError {
    #[serde(rename = "Error")]
    pub error: PascalDetail,
}

#[derive(Debug, Deserialize)]
pub struct PascalDetail {
    #[serde(rename = "Code", default)]
    pub code: Option<String>,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

impl ErrorDescriptor for PascalError {
    fn message(&self) -> String {
        self.error
            .message
            .clone()
            .or_else(|| self.error.code.clone())
            .unwrap_or_default()
    }
}

/// `{"errors": [{"message": "..."}, ...]}`, as returned by GraphQL endpoints
#[derive(Debug, Deserialize)]
pub struct ErrorList {
    pub errors: Vec<ErrorDetail>,
}

impl ErrorDescriptor for ErrorList {
    fn message(&self) -> String {
        self.errors
            .iter()
            .map(ErrorDetail::describe)
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
