//! CLI commands and argument parsing

use crate::providers::Provider;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Uniform connectors for SaaS APIs
#[derive(Parser, Debug)]
#[command(name = "solidafy-connectors")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connector configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Provider, overriding the one named in the config file
    #[arg(short, long, global = true)]
    pub provider: Option<Provider>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List providers with their auth scheme and supported verbs
    Providers,

    /// Describe objects and their fields
    Metadata {
        /// Objects to describe (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        objects: Vec<String>,
    },

    /// Read one page of records
    Read {
        #[arg(long)]
        object: String,

        /// Fields to return (comma-separated, `*` for all)
        #[arg(long, default_value = "*")]
        fields: String,

        /// Only records modified at or after this RFC 3339 instant
        #[arg(long)]
        since: Option<DateTime<Utc>>,

        /// Only records modified before this RFC 3339 instant
        #[arg(long)]
        until: Option<DateTime<Utc>>,

        /// Cursor returned by a previous read
        #[arg(long)]
        next_page: Option<String>,

        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Create a record, or update one when --record-id is given
    Write {
        #[arg(long)]
        object: String,

        #[arg(long)]
        record_id: Option<String>,

        /// Record body as a JSON object
        #[arg(long)]
        data: String,
    },

    /// Delete a record
    Delete {
        #[arg(long)]
        object: String,

        #[arg(long)]
        record_id: String,
    },

    /// Generate a static catalog from an OpenAPI document
    Schema {
        /// OpenAPI 3 document (JSON or YAML)
        #[arg(long)]
        openapi: PathBuf,

        #[arg(long, default_value = "root")]
        module: String,

        /// Path prefix shared by the module's objects
        #[arg(long, default_value = "")]
        path: String,

        /// Write the catalog here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
