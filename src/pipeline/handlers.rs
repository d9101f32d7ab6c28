//! Per-verb handler traits implemented by provider bindings
//!
//! A binding supplies request builders and response parsers; the pipelines
//! own validation, registry checks, incremental planning and marshaling and
//! never branch on provider identity.

use super::locate::RecordIdLocator;
use crate::error::{Error, ErrorKind, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::incremental::TimeFieldSpec;
use crate::types::{
    DeleteResult, JsonObject, JsonValue, ReadParams, RecordData, WriteResult,
};

// ============================================================================
// Read
// ============================================================================

/// Everything a read handler may consult while building or parsing a page
#[derive(Debug, Clone, Copy)]
pub struct ReadContext<'a> {
    pub module: &'a str,
    pub params: &'a ReadParams,
    /// Add the provider's time query parameters
    pub provider_side: bool,
    /// Requested page size, or the object's default
    pub page_size: Option<u32>,
}

impl<'a> ReadContext<'a> {
    pub fn object(&self) -> &'a str {
        &self.params.object_name
    }

    /// Cursor from the previous page, reusable as the request URL
    pub fn next_page(&self) -> Option<&'a str> {
        self.params.next_page.as_deref()
    }
}

/// One parsed page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadPage {
    pub records: Vec<JsonValue>,
    pub next_page: Option<String>,
}

impl ReadPage {
    pub fn new(records: Vec<JsonValue>, next_page: Option<String>) -> Self {
        Self { records, next_page }
    }
}

pub trait ReadHandler: Send + Sync {
    fn build_request(&self, ctx: &ReadContext<'_>) -> Result<HttpRequest>;

    /// `request_url` is the absolute URL that produced `response`
    fn parse_response(
        &self,
        ctx: &ReadContext<'_>,
        request_url: &str,
        response: &HttpResponse,
    ) -> Result<ReadPage>;

    /// Incremental behaviour of an object, `None` when it has none
    fn time_field(&self, _module: &str, _object: &str) -> Option<TimeFieldSpec> {
        None
    }

    /// Page size used when the caller sets none
    fn default_page_size(&self, _object: &str) -> Option<u32> {
        None
    }

    /// Cheap request checking that the provider accepts its time filter
    fn probe_request(&self, _ctx: &ReadContext<'_>) -> Result<Option<HttpRequest>> {
        Ok(None)
    }

    /// Whether a cursor handed out by the provider still narrows the listing by time
    fn cursor_keeps_time_filter(&self, _next_page: &str) -> bool {
        true
    }
}

// ============================================================================
// Write
// ============================================================================

/// Create or update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod<'a> {
    Create,
    Update(&'a str),
}

#[derive(Debug, Clone, Copy)]
pub struct WriteContext<'a> {
    pub module: &'a str,
    pub object: &'a str,
    pub method: WriteMethod<'a>,
    pub data: &'a RecordData,
}

impl<'a> WriteContext<'a> {
    pub fn record_id(&self) -> Option<&'a str> {
        match self.method {
            WriteMethod::Create => None,
            WriteMethod::Update(id) => Some(id),
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self.method, WriteMethod::Update(_))
    }

    /// The payload as a JSON object
    pub fn object_data(&self) -> Result<JsonObject> {
        self.data.to_object()
    }
}

pub trait WriteHandler: Send + Sync {
    fn build_request(&self, ctx: &WriteContext<'_>) -> Result<HttpRequest>;

    /// Record id from headers or body, the parsed body echoed as `data`
    fn parse_response(&self, ctx: &WriteContext<'_>, response: &HttpResponse) -> Result<WriteResult> {
        let record_id = RecordIdLocator::new(ctx.object)
            .locate(response)?
            .or_else(|| ctx.record_id().map(String::from));
        let data = response
            .body()
            .ok()
            .flatten()
            .and_then(JsonValue::as_object)
            .cloned();
        Ok(WriteResult::success(record_id, data))
    }
}

// ============================================================================
// Delete
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct DeleteContext<'a> {
    pub module: &'a str,
    pub object: &'a str,
    pub record_id: &'a str,
}

pub trait DeleteHandler: Send + Sync {
    fn build_request(&self, ctx: &DeleteContext<'_>) -> Result<HttpRequest>;

    /// Success iff the provider answered 200 or 204
    fn parse_response(&self, _ctx: &DeleteContext<'_>, response: &HttpResponse) -> Result<DeleteResult> {
        match response.status() {
            200 | 204 => Ok(DeleteResult { success: true }),
            status => Err(Error::with_message(
                ErrorKind::RequestFailed,
                format!("unexpected status {status}"),
            )),
        }
    }
}
