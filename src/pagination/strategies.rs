//! Pagination strategy implementations

use super::types::{PageContext, PaginationKind, Paginator};
use crate::error::Result;
use crate::jsonquery::JsonQuery;
use crate::types::JsonValue;
use crate::urlbuilder::UrlBuilder;
use std::sync::Arc;
use tracing::debug;

type EncodingExceptions = &'static [(&'static str, &'static str)];

/// Value at `path`; missing keys and non-object parents read as absent
fn value_at<'a>(body: &'a JsonValue, path: &[String]) -> Option<&'a JsonValue> {
    let (last, parents) = path.split_last()?;
    let parents: Vec<&str> = parents.iter().map(String::as_str).collect();
    JsonQuery::new(body)
        .zoom(&parents)
        .value_optional(last)
        .ok()
        .flatten()
}

/// Non-empty string at `path`
fn string_at(body: &JsonValue, path: &[String]) -> Option<String> {
    match value_at(body, path)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Cursor at `path` as text; arrays and objects are opaque and sent back as JSON
fn token_at(body: &JsonValue, path: &[String]) -> Option<String> {
    match value_at(body, path)? {
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Array(items) if items.is_empty() => None,
        JsonValue::Object(fields) if fields.is_empty() => None,
        opaque @ (JsonValue::Array(_) | JsonValue::Object(_)) => {
            serde_json::to_string(opaque).ok()
        }
        _ => string_at(body, path),
    }
}

fn segments(path: &[&str]) -> Vec<String> {
    path.iter().map(|s| (*s).to_string()).collect()
}

// ============================================================================
// Offset Page Pagination
// ============================================================================

/// Page-number pagination that increments a query parameter
///
/// Done when a page holds fewer records than the requested page size.
#[derive(Debug, Clone)]
pub struct OffsetPagePaginator {
    /// Query parameter name for page number
    pub page_param: String,
    /// Page number assumed when the request carried none
    pub start_page: u64,
    encoding_exceptions: EncodingExceptions,
}

impl OffsetPagePaginator {
    pub fn new(page_param: impl Into<String>, start_page: u64) -> Self {
        Self {
            page_param: page_param.into(),
            start_page,
            encoding_exceptions: &[],
        }
    }

    /// Keep bracket or sigil characters literal when rebuilding the URL
    #[must_use]
    pub fn with_encoding_exceptions(mut self, exceptions: EncodingExceptions) -> Self {
        self.encoding_exceptions = exceptions;
        self
    }
}

impl Paginator for OffsetPagePaginator {
    fn next_page(&self, ctx: &PageContext<'_>) -> Result<Option<String>> {
        let short_page = ctx
            .page_size
            .is_some_and(|size| ctx.record_count < size as usize);
        if ctx.record_count == 0 || short_page {
            debug!(records = ctx.record_count, "Offset pagination exhausted");
            return Ok(None);
        }

        let mut url = UrlBuilder::parse(ctx.request_url)?;
        let current = url
            .query_param(&self.page_param)
            .and_then(|p| p.parse::<u64>().ok())
            .unwrap_or(self.start_page);

        url.with_query_param(self.page_param.clone(), (current + 1).to_string())
            .add_encoding_exceptions(self.encoding_exceptions);
        Ok(Some(url.to_string()))
    }
}

// ============================================================================
// Next URL Pagination
// ============================================================================

/// Candidate locations of a next-page URL in common response envelopes
pub const NEXT_URL_PATHS: &[&[&str]] = &[
    &["meta", "next_page_link"],
    &["links", "next"],
    &["pagination", "next"],
    &["paging", "next"],
    &["data", "paging", "next"],
    &["_links", "next", "href"],
    &["@odata.nextLink"],
    &["next"],
];

/// Next URL pagination (URL in response body)
///
/// The first non-empty string found at one of the candidate paths is the
/// cursor, passed back verbatim as the next request URL.
#[derive(Debug, Clone)]
pub struct NextUrlPaginator {
    paths: Vec<Vec<String>>,
}

impl Default for NextUrlPaginator {
    fn default() -> Self {
        Self::new(NEXT_URL_PATHS)
    }
}

impl NextUrlPaginator {
    pub fn new(paths: &[&[&str]]) -> Self {
        Self {
            paths: paths.iter().map(|p| segments(p)).collect(),
        }
    }
}

impl Paginator for NextUrlPaginator {
    fn next_page(&self, ctx: &PageContext<'_>) -> Result<Option<String>> {
        let Some(body) = ctx.body else {
            return Ok(None);
        };

        for path in &self.paths {
            if let Some(next) = string_at(body, path) {
                debug!(path = %path.join("."), "Found next page URL");
                return Ok(Some(next));
            }
        }
        Ok(None)
    }
}

// ============================================================================
// Relay Pagination
// ============================================================================

/// Relay/GraphQL pagination (`pageInfo.hasNextPage` + `pageInfo.endCursor`)
#[derive(Debug, Clone)]
pub struct RelayPaginator {
    page_info: Vec<String>,
}

impl Default for RelayPaginator {
    fn default() -> Self {
        Self::new(&["pageInfo"])
    }
}

impl RelayPaginator {
    /// Paginator reading the `pageInfo` object at `path`
    pub fn new(path: &[&str]) -> Self {
        Self {
            page_info: segments(path),
        }
    }
}

impl Paginator for RelayPaginator {
    fn next_page(&self, ctx: &PageContext<'_>) -> Result<Option<String>> {
        let Some(body) = ctx.body else {
            return Ok(None);
        };

        let zoom: Vec<&str> = self.page_info.iter().map(String::as_str).collect();
        let page_info = JsonQuery::new(body).zoom(&zoom);

        if !page_info.bool_optional("hasNextPage")?.unwrap_or(false) {
            return Ok(None);
        }
        Ok(page_info
            .string_optional("endCursor")?
            .filter(|c| !c.is_empty())
            .map(String::from))
    }
}

// ============================================================================
// Token Pagination
// ============================================================================

/// Token pagination: a token from the body set as a query parameter on the
/// previous request URL
#[derive(Debug, Clone)]
pub struct TokenPaginator {
    token_path: Vec<String>,
    /// Query parameter carrying the token
    pub param: String,
    encoding_exceptions: EncodingExceptions,
}

impl TokenPaginator {
    pub fn new(token_path: &[&str], param: impl Into<String>) -> Self {
        Self {
            token_path: segments(token_path),
            param: param.into(),
            encoding_exceptions: &[],
        }
    }

    #[must_use]
    pub fn with_encoding_exceptions(mut self, exceptions: EncodingExceptions) -> Self {
        self.encoding_exceptions = exceptions;
        self
    }
}

impl Paginator for TokenPaginator {
    fn next_page(&self, ctx: &PageContext<'_>) -> Result<Option<String>> {
        let Some(body) = ctx.body else {
            return Ok(None);
        };
        let Some(token) = token_at(body, &self.token_path) else {
            return Ok(None);
        };

        let mut url = UrlBuilder::parse(ctx.request_url)?;
        url.with_query_param(self.param.clone(), token)
            .add_encoding_exceptions(self.encoding_exceptions);
        Ok(Some(url.to_string()))
    }
}

// ============================================================================
// Link Header Pagination
// ============================================================================

/// Link header pagination (RFC 5988)
///
/// Format: `Link: <https://api.example.com/...?page=2>; rel="next", ...`
#[derive(Debug, Clone)]
pub struct LinkHeaderPaginator {
    /// Rel value to follow (default: "next")
    pub rel: String,
}

impl Default for LinkHeaderPaginator {
    fn default() -> Self {
        Self {
            rel: "next".to_string(),
        }
    }
}

impl Paginator for LinkHeaderPaginator {
    fn next_page(&self, ctx: &PageContext<'_>) -> Result<Option<String>> {
        Ok(ctx
            .headers
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(|header| parse_link_header(header, &self.rel)))
    }
}

/// Parse a Link header and extract the URL for the given rel
pub(crate) fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    for part in header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.trim().split(';') {
            let segment = segment.trim();
            if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                url = Some(inner);
            } else if let Some(stripped) = segment.strip_prefix("rel=") {
                rel = Some(stripped.trim_matches('"').trim_matches('\''));
            }
        }

        if let (Some(u), Some(r)) = (url, rel) {
            if r.split_whitespace().any(|r| r == target_rel) {
                return Some(u.to_string());
            }
        }
    }

    None
}

// ============================================================================
// No Pagination
// ============================================================================

/// Single-page listings
#[derive(Debug, Clone, Default)]
pub struct NoPaginator;

impl Paginator for NoPaginator {
    fn next_page(&self, _ctx: &PageContext<'_>) -> Result<Option<String>> {
        Ok(None)
    }
}

impl PaginationKind {
    /// Paginator with the conventional parameters of this dialect
    pub fn paginator(self) -> Arc<dyn Paginator> {
        match self {
            PaginationKind::None => Arc::new(NoPaginator),
            PaginationKind::OffsetPage => Arc::new(OffsetPagePaginator::new("page", 1)),
            PaginationKind::NextUrl => Arc::new(NextUrlPaginator::default()),
            PaginationKind::Relay => Arc::new(RelayPaginator::default()),
            PaginationKind::Token => Arc::new(TokenPaginator::new(
                &["metadata", "nextPageToken"],
                "pageToken",
            )),
            PaginationKind::LinkHeader => Arc::new(LinkHeaderPaginator::default()),
        }
    }
}
