//! Error interpreter
//!
//! Maps heterogeneous provider error bodies onto the closed [`ErrorKind`]
//! taxonomy:
//!
//! 1. The HTTP status selects a base kind through the [`StatusMap`].
//! 2. The body is decoded (JSON, or XML converted to JSON) and matched
//!    against a [`FormatSwitch`] to extract the provider's message.
//! 3. Unmatched non-empty bodies contribute their raw text as the message.
//!
//! Providers that answer 200 with an error payload install a
//! [`BodyStatusCheck`], which routes the embedded status code through the
//! same classification after a successful response.

mod formats;
mod status;
mod xml;

pub use formats::{
    ErrorDescriptor, ErrorDetail, ErrorList, FormatSwitch, MessageError, NestedError,
    OAuthError, StringError, Template,
};
pub use status::StatusMap;
pub use xml::xml_to_json;

use crate::error::{Error, ErrorKind, Result};
use crate::http::{ErrorHandler, HttpResponse};
use crate::jsonquery::extract_text;
use crate::types::JsonValue;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use tracing::debug;

/// Status code embedded in an otherwise successful response body
#[derive(Debug, Clone)]
pub struct BodyStatusCheck {
    /// Dotted path of the numeric status field
    pub status_field: String,
    /// Dotted path of the message field
    pub message_field: Option<String>,
    /// Codes that mean success
    pub success_codes: Vec<i64>,
}

impl BodyStatusCheck {
    pub fn new(status_field: impl Into<String>) -> Self {
        Self {
            status_field: status_field.into(),
            message_field: None,
            success_codes: vec![200],
        }
    }

    #[must_use]
    pub fn with_message_field(mut self, field: impl Into<String>) -> Self {
        self.message_field = Some(field.into());
        self
    }

    /// Embedded status and message when the body reports a failure
    fn failure(&self, body: &JsonValue) -> Option<(i64, Option<String>)> {
        let code = extract_text(body, &self.status_field)?.parse::<i64>().ok()?;
        if self.success_codes.contains(&code) {
            return None;
        }
        let message = self
            .message_field
            .as_deref()
            .and_then(|field| extract_text(body, field));
        Some((code, message))
    }
}

/// Default [`ErrorHandler`]: status map plus body format switches
#[derive(Debug)]
pub struct ErrorInterpreter {
    json: FormatSwitch,
    xml: FormatSwitch,
    status: StatusMap,
    body_status: Option<BodyStatusCheck>,
}

impl Default for ErrorInterpreter {
    fn default() -> Self {
        Self {
            json: FormatSwitch::default_json(),
            xml: FormatSwitch::default_xml(),
            status: StatusMap::default(),
            body_status: None,
        }
    }
}

impl ErrorInterpreter {
    /// Replace the JSON templates
    #[must_use]
    pub fn with_json_formats(mut self, formats: FormatSwitch) -> Self {
        self.json = formats;
        self
    }

    /// Replace the XML templates
    #[must_use]
    pub fn with_xml_formats(mut self, formats: FormatSwitch) -> Self {
        self.xml = formats;
        self
    }

    /// Override the kind for one status code
    #[must_use]
    pub fn with_status_override(mut self, status: u16, kind: ErrorKind) -> Self {
        self.status = self.status.with_override(status, kind);
        self
    }

    /// Inspect 2xx bodies for an embedded failure status
    #[must_use]
    pub fn with_body_status(mut self, check: BodyStatusCheck) -> Self {
        self.body_status = Some(check);
        self
    }

    /// Classify an error response
    pub fn interpret(&self, status: u16, content_type: Option<&str>, body: &[u8]) -> Error {
        let kind = self.status.kind_for(status);
        let message = self.describe(content_type, body);
        debug!(status, %kind, ?message, "Interpreted error response");

        Error::Connector { kind, message }
    }

    /// Provider message from a body, falling back to its raw text
    fn describe(&self, content_type: Option<&str>, body: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let is_xml = content_type.is_some_and(|ct| ct.contains("xml")) || text.starts_with('<');
        let described = if is_xml {
            xml_to_json(text)
                .ok()
                .and_then(|node| self.xml.describe(&node))
        } else {
            serde_json::from_str::<JsonValue>(text)
                .ok()
                .and_then(|node| self.json.describe(&node))
        };

        Some(described.unwrap_or_else(|| text.to_string()))
    }

    fn kind_for_embedded(&self, code: i64) -> ErrorKind {
        match u16::try_from(code) {
            Ok(status) if (400..600).contains(&status) => self.status.kind_for(status),
            _ => ErrorKind::RequestFailed,
        }
    }
}

impl ErrorHandler for ErrorInterpreter {
    fn handle(&self, status: u16, headers: &HeaderMap, body: &[u8]) -> Error {
        let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        self.interpret(status, content_type, body)
    }

    fn inspect_success(&self, response: &HttpResponse) -> Result<()> {
        let Some(check) = &self.body_status else {
            return Ok(());
        };
        let Ok(Some(body)) = response.body() else {
            return Ok(());
        };

        match check.failure(body) {
            None => Ok(()),
            Some((code, message)) => {
                let kind = self.kind_for_embedded(code);
                let message = message.or_else(|| self.json.describe(body));
                debug!(code, %kind, "Response body reports failure");
                Err(Error::Connector { kind, message })
            }
        }
    }
}
