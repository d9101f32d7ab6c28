//! Pagination module
//!
//! Supports: Offset Page, Next URL (body cursor, OData), Relay, Token,
//! Link Header
//!
//! # Overview
//!
//! A paginator turns one fetched page into the opaque cursor for the next
//! one. The cursor is either a complete URL or a provider token; callers
//! never parse it. Paginators hold no state between pages.

mod strategies;
mod types;

pub use strategies::{
    LinkHeaderPaginator, NextUrlPaginator, NoPaginator, OffsetPagePaginator, RelayPaginator,
    TokenPaginator, NEXT_URL_PATHS,
};
pub use types::{PageContext, PaginationKind, Paginator};

#[cfg(test)]
mod tests;
