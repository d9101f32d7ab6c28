//! # Solidafy Connectors
//!
//! One uniform interface over many SaaS provider APIs: list object metadata,
//! read a page of records, write a record, delete a record.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_connectors::auth::AuthConfig;
//! use solidafy_connectors::connector::{Connector, ConnectorParams};
//! use solidafy_connectors::providers::Provider;
//! use solidafy_connectors::{FieldSelection, ReadParams, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let auth = AuthConfig::dual_header("X-Api-Key", "key", "X-Api-Password", "secret")?;
//!     let connector = Provider::Groove.connector(ConnectorParams::new(auth))?;
//!
//!     let page = connector
//!         .read(ReadParams::new("contacts", FieldSelection::named(["id", "email"])))
//!         .await?;
//!     println!("{} rows, done = {}", page.rows, page.done);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Connector Interface                         │
//! │  list_object_metadata()   read()   write()   delete()           │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬─────────────┬───────────┐
//! │   Auth   │   HTTP    │   Paginate    │ Incremental │  Schema   │
//! ├──────────┼───────────┼───────────────┼─────────────┼───────────┤
//! │ API Key  │ Send      │ Next URL      │ Provider    │ Static    │
//! │ Basic    │ Throttle  │ Offset/Page   │ Connector   │ Sampled   │
//! │ OAuth2   │ Errors    │ Token/Relay   │ Probe       │ OpenAPI   │
//! │ Dual Hdr │           │               │             │           │
//! └──────────┴───────────┴───────────────┴─────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types and the provider error taxonomy
pub mod error;

/// Common types and type aliases
pub mod types;

/// URL construction with query parameters
pub mod urlbuilder;

/// JSON navigation helpers
pub mod jsonquery;

/// Authentication implementations
pub mod auth;

/// HTTP client with rate limiting
pub mod http;

/// Error response interpretation
pub mod interpreter;

/// Static catalogs, metadata strategies and OpenAPI extraction
pub mod schema;

/// Object/verb endpoint registry
pub mod registry;

/// Pagination strategies
pub mod pagination;

/// Time-window planning and filtering
pub mod incremental;

/// Read/write/delete request pipelines
pub mod pipeline;

/// Connector trait and construction
pub mod connector;

/// Template interpolation
pub mod template;

/// Connector configuration files
pub mod config;

/// Provider bindings
pub mod providers;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result};
pub use types::*;

pub use config::ConnectorConfig;
pub use connector::{Connector, ConnectorParams, GenericConnector};
pub use providers::Provider;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
