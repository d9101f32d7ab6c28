//! Tests for the pagination module

use super::strategies::parse_link_header;
use super::*;
use crate::urlbuilder::{UrlBuilder, QUERY_ENCODING_EXCEPTIONS};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use test_case::test_case;

fn no_headers() -> HeaderMap {
    HeaderMap::new()
}

// ============================================================================
// Offset Page
// ============================================================================

#[test]
fn test_offset_page_increments() {
    let headers = no_headers();
    let body = json!({"contacts": []});
    let ctx = PageContext::new(
        "https://api.example.com/v1/contacts?page=2&perPage=2",
        Some(&body),
        &headers,
    )
    .with_records(2, Some(2));

    let next = OffsetPagePaginator::new("page", 1).next_page(&ctx).unwrap();
    assert_eq!(
        next.as_deref(),
        Some("https://api.example.com/v1/contacts?page=3&perPage=2")
    );
}

#[test]
fn test_offset_page_starts_from_default() {
    let headers = no_headers();
    let ctx = PageContext::new("https://api.example.com/items?perPage=2", None, &headers)
        .with_records(2, Some(2));

    let next = OffsetPagePaginator::new("page", 1).next_page(&ctx).unwrap();
    assert_eq!(
        next.as_deref(),
        Some("https://api.example.com/items?page=2&perPage=2")
    );
}

#[test_case(1, Some(2); "short page")]
#[test_case(0, Some(2); "empty page")]
#[test_case(0, None; "empty page without size")]
fn test_offset_page_done(records: usize, page_size: Option<u32>) {
    let headers = no_headers();
    let ctx = PageContext::new("https://api.example.com/items?page=4", None, &headers)
        .with_records(records, page_size);
    assert_eq!(OffsetPagePaginator::new("page", 1).next_page(&ctx).unwrap(), None);
}

#[test]
fn test_offset_page_keeps_bracket_params() {
    let headers = no_headers();
    let ctx = PageContext::new(
        "https://api.example.com/contacts?query[createdOn][from]=2024-01-01T00:00:00Z",
        None,
        &headers,
    )
    .with_records(1, Some(1));

    let next = OffsetPagePaginator::new("page", 1)
        .with_encoding_exceptions(&QUERY_ENCODING_EXCEPTIONS)
        .next_page(&ctx)
        .unwrap()
        .unwrap();
    assert_eq!(
        next,
        "https://api.example.com/contacts?page=2&query[createdOn][from]=2024-01-01T00%3A00%3A00Z"
    );
}

// ============================================================================
// Next URL
// ============================================================================

#[test]
fn test_next_url_meta_link() {
    let headers = no_headers();
    let body = json!({
        "users": [{"id": 1}, {"id": 2}],
        "meta": {"next_page_link": "https://api.example.com/v1/users?per_page=2&page=2"}
    });
    let ctx = PageContext::new("https://api.example.com/v1/users?per_page=2", Some(&body), &headers);

    assert_eq!(
        NextUrlPaginator::default().next_page(&ctx).unwrap().as_deref(),
        Some("https://api.example.com/v1/users?per_page=2&page=2")
    );
}

#[test]
fn test_next_url_odata_key_with_dot() {
    let headers = no_headers();
    let body = json!({"value": [], "@odata.nextLink": "https://graph.example.com/next"});
    let ctx = PageContext::new("https://graph.example.com/v1.0/users", Some(&body), &headers);

    assert_eq!(
        NextUrlPaginator::default().next_page(&ctx).unwrap().as_deref(),
        Some("https://graph.example.com/next")
    );
}

#[test]
fn test_next_url_hal_link() {
    let headers = no_headers();
    let body = json!({"_links": {"next": {"href": "https://api.example.com/users?page=2"}}});
    let ctx = PageContext::new("https://api.example.com/users", Some(&body), &headers);

    assert_eq!(
        NextUrlPaginator::default().next_page(&ctx).unwrap().as_deref(),
        Some("https://api.example.com/users?page=2")
    );
}

#[test_case(json!({"meta": {"next_page_link": ""}}); "empty link")]
#[test_case(json!({"meta": {"next_page_link": null}}); "null link")]
#[test_case(json!({"links": ["not", "an", "object"]}); "unexpected shape")]
#[test_case(json!({"users": []}); "absent")]
fn test_next_url_exhausted(body: serde_json::Value) {
    let headers = no_headers();
    let ctx = PageContext::new("https://api.example.com/v1/users", Some(&body), &headers);
    assert_eq!(NextUrlPaginator::default().next_page(&ctx).unwrap(), None);
}

// ============================================================================
// Relay
// ============================================================================

#[test]
fn test_relay_next_cursor() {
    let headers = no_headers();
    let body = json!({"data": {"search": {"customers": {
        "edges": [],
        "pageInfo": {"hasNextPage": true, "endCursor": "abc"}
    }}}});
    let ctx = PageContext::new("/graphql", Some(&body), &headers);

    let paginator = RelayPaginator::new(&["data", "search", "customers", "pageInfo"]);
    assert_eq!(paginator.next_page(&ctx).unwrap().as_deref(), Some("abc"));
}

#[test]
fn test_relay_last_page() {
    let headers = no_headers();
    let body = json!({"pageInfo": {"hasNextPage": false, "endCursor": "abc"}});
    let ctx = PageContext::new("/graphql", Some(&body), &headers);
    assert_eq!(RelayPaginator::default().next_page(&ctx).unwrap(), None);
}

// ============================================================================
// Token
// ============================================================================

#[test]
fn test_token_sets_query_param() {
    let headers = no_headers();
    let body = json!({"elements": [{}], "metadata": {"nextPageToken": "tok-2"}});
    let ctx = PageContext::new(
        "https://api.example.com/rest/adAccounts?q=search&pageSize=1&pageToken=tok-1",
        Some(&body),
        &headers,
    );

    let next = TokenPaginator::new(&["metadata", "nextPageToken"], "pageToken")
        .next_page(&ctx)
        .unwrap();
    assert_eq!(
        next.as_deref(),
        Some("https://api.example.com/rest/adAccounts?pageSize=1&pageToken=tok-2&q=search")
    );
}

#[test]
fn test_token_numeric_offset() {
    let headers = no_headers();
    let body = json!({"offset": 40});
    let ctx = PageContext::new("https://api.example.com/items", Some(&body), &headers);

    let next = TokenPaginator::new(&["offset"], "offset").next_page(&ctx).unwrap();
    assert_eq!(next.as_deref(), Some("https://api.example.com/items?offset=40"));
}

#[test]
fn test_token_opaque_array_offset() {
    let headers = no_headers();
    let body = json!({"records": [{}], "offset": ["itrABC", "rec123"]});
    let ctx = PageContext::new("https://api.example.com/items", Some(&body), &headers);

    let next = TokenPaginator::new(&["offset"], "offset")
        .next_page(&ctx)
        .unwrap()
        .unwrap();
    let url = UrlBuilder::parse(&next).unwrap();
    assert_eq!(url.query_param("offset"), Some(r#"["itrABC","rec123"]"#));
}

#[test_case(json!({"metadata": {}}); "absent token")]
#[test_case(json!({"metadata": {"nextPageToken": ""}}); "empty token")]
#[test_case(json!({"metadata": {"nextPageToken": []}}); "empty array token")]
fn test_token_done(body: serde_json::Value) {
    let headers = no_headers();
    let ctx = PageContext::new("https://api.example.com/items", Some(&body), &headers);
    let paginator = TokenPaginator::new(&["metadata", "nextPageToken"], "pageToken");
    assert_eq!(paginator.next_page(&ctx).unwrap(), None);
}

// ============================================================================
// Link Header
// ============================================================================

#[test]
fn test_parse_link_header() {
    let header = r#"<https://api.example.com/items?page=2>; rel="next", <https://api.example.com/items?page=5>; rel="last""#;
    assert_eq!(
        parse_link_header(header, "next"),
        Some("https://api.example.com/items?page=2".to_string())
    );
    assert_eq!(
        parse_link_header(header, "last"),
        Some("https://api.example.com/items?page=5".to_string())
    );
    assert_eq!(parse_link_header(header, "prev"), None);
}

#[test]
fn test_link_header_paginator() {
    let mut headers = HeaderMap::new();
    headers.insert(
        "link",
        HeaderValue::from_static(r#"<https://api.example.com/items?page=2>; rel="next""#),
    );
    let ctx = PageContext::new("https://api.example.com/items", None, &headers);
    assert_eq!(
        LinkHeaderPaginator::default().next_page(&ctx).unwrap().as_deref(),
        Some("https://api.example.com/items?page=2")
    );

    let empty = no_headers();
    let ctx = PageContext::new("https://api.example.com/items", None, &empty);
    assert_eq!(LinkHeaderPaginator::default().next_page(&ctx).unwrap(), None);
}

// ============================================================================
// Kinds
// ============================================================================

#[test]
fn test_kind_serialization() {
    let kind: PaginationKind = serde_json::from_str("\"nextUrl\"").unwrap();
    assert_eq!(kind, PaginationKind::NextUrl);
    assert_eq!(
        serde_json::to_string(&PaginationKind::OffsetPage).unwrap(),
        "\"offsetPage\""
    );
}

#[test]
fn test_no_paginator() {
    let headers = no_headers();
    let body = json!({"next": "https://x"});
    let ctx = PageContext::new("https://x", Some(&body), &headers);
    assert_eq!(PaginationKind::None.paginator().next_page(&ctx).unwrap(), None);
}
