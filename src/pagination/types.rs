//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use crate::error::Result;
use crate::types::JsonValue;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Everything a paginator may look at after one page was fetched
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// URL of the request that produced this page
    pub request_url: &'a str,
    /// Parsed response body, if any
    pub body: Option<&'a JsonValue>,
    pub headers: &'a HeaderMap,
    /// Number of records extracted from this page
    pub record_count: usize,
    /// Page size that was requested
    pub page_size: Option<u32>,
}

impl<'a> PageContext<'a> {
    pub fn new(request_url: &'a str, body: Option<&'a JsonValue>, headers: &'a HeaderMap) -> Self {
        Self {
            request_url,
            body,
            headers,
            record_count: 0,
            page_size: None,
        }
    }

    #[must_use]
    pub fn with_records(mut self, record_count: usize, page_size: Option<u32>) -> Self {
        self.record_count = record_count;
        self.page_size = page_size;
        self
    }
}

/// Computes the opaque cursor for the next page.
///
/// Paginators are stateless: the same context always yields the same
/// cursor, so re-reading a cursor returns the same page.
pub trait Paginator: Send + Sync + Debug {
    /// `None` when the listing is exhausted
    fn next_page(&self, ctx: &PageContext<'_>) -> Result<Option<String>>;
}

/// Pagination dialect names used by schema catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaginationKind {
    #[default]
    None,
    OffsetPage,
    NextUrl,
    Relay,
    Token,
    LinkHeader,
}
