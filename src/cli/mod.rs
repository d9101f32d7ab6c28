//! CLI module
//!
//! Command-line interface over the provider connectors.
//!
//! # Commands
//!
//! - `providers` - List providers
//! - `metadata` - Describe objects
//! - `read` - Read one page of records
//! - `write` - Create or update a record
//! - `delete` - Delete a record
//! - `schema` - Generate a catalog from an OpenAPI document

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
