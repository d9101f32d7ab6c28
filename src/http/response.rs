//! Buffered provider response
//!
//! The body is read once into memory. Its JSON form is parsed lazily on the
//! first `body()` call and cached for later callers.

use crate::error::{Error, ErrorKind, Result};
use crate::types::JsonValue;
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use std::borrow::Cow;
use std::sync::OnceLock;

#[derive(Debug)]
pub struct HttpResponse {
    status: u16,
    headers: HeaderMap,
    bytes: Bytes,
    json: OnceLock<Option<JsonValue>>,
}

impl HttpResponse {
    pub fn new(status: u16, headers: HeaderMap, bytes: Bytes) -> Self {
        Self {
            status,
            headers,
            bytes,
            json: OnceLock::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text, if present and valid
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Parsed JSON body; `None` for an empty body
    pub fn body(&self) -> Result<Option<&JsonValue>> {
        if let Some(parsed) = self.json.get() {
            return Ok(parsed.as_ref());
        }

        let parsed = if self.bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(serde_json::from_slice(&self.bytes).map_err(|e| {
                Error::with_message(ErrorKind::FailedToUnmarshalBody, e.to_string())
            })?)
        };

        Ok(self.json.get_or_init(|| parsed).as_ref())
    }

    /// Parsed JSON body, failing on an empty body
    pub fn body_required(&self) -> Result<&JsonValue> {
        self.body()?
            .ok_or_else(|| ErrorKind::EmptyJsonHttpResponse.into())
    }
}
