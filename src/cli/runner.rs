//! CLI runner - executes commands

use crate::auth::AuthConfig;
use crate::cli::commands::{Cli, Commands};
use crate::config::ConnectorConfig;
use crate::connector::{Connector, ConnectorParams, GenericConnector};
use crate::error::{Error, Result};
use crate::providers::Provider;
use crate::schema::{OpenApiExtractor, SchemaCatalog};
use crate::types::{DeleteParams, FieldSelection, JsonValue, ReadParams, WriteParams};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Providers => self.providers(),
            Commands::Metadata { objects } => {
                let connector = self.connector()?;
                emit(&connector.list_object_metadata(objects).await?)
            }
            Commands::Read {
                object,
                fields,
                since,
                until,
                next_page,
                page_size,
            } => {
                let params = read_params(
                    object,
                    fields,
                    *since,
                    *until,
                    next_page.as_deref(),
                    *page_size,
                );
                let connector = self.connector()?;
                emit(&connector.read(params).await?)
            }
            Commands::Write {
                object,
                record_id,
                data,
            } => {
                let params = write_params(object, record_id.as_deref(), data)?;
                let connector = self.connector()?;
                emit(&connector.write(params).await?)
            }
            Commands::Delete { object, record_id } => {
                let connector = self.connector()?;
                emit(&connector.delete(DeleteParams::new(object, record_id)).await?)
            }
            Commands::Schema {
                openapi,
                module,
                path,
                output,
            } => self.schema(openapi, module, path, output.as_deref()),
        }
    }

    /// Build the connector from `--config` and `--provider`
    fn connector(&self) -> Result<GenericConnector> {
        let (provider, params) = match &self.cli.config {
            Some(path) => {
                let config = ConnectorConfig::load(path)?;
                let provider = self.cli.provider.unwrap_or(config.provider);
                (provider, config.to_params()?)
            }
            None => {
                let provider = self.cli.provider.ok_or_else(|| {
                    Error::config("No provider given (use --config or --provider)")
                })?;
                (provider, ConnectorParams::new(AuthConfig::None))
            }
        };
        debug!(provider = %provider, "Building connector");
        provider.connector(params)
    }

    fn providers(&self) -> Result<()> {
        let listing: Vec<JsonValue> = Provider::ALL
            .iter()
            .map(|provider| {
                let info = provider.info();
                json!({
                    "name": info.name,
                    "displayName": info.display_name,
                    "auth": info.auth,
                    "support": info.support,
                    "requiresWorkspace": info.requires_workspace,
                    "staticCatalog": provider.static_catalog().is_some(),
                })
            })
            .collect();
        emit(&listing)
    }

    fn schema(&self, openapi: &Path, module: &str, path: &str, output: Option<&Path>) -> Result<()> {
        let raw = fs::read_to_string(openapi)?;
        let extracted = OpenApiExtractor::parse(&raw)?.extract(module, path)?;
        debug!(
            module = module,
            objects = extracted.objects.len(),
            "Extracted OpenAPI objects"
        );

        let mut catalog = SchemaCatalog::new();
        catalog.add_module(extracted);
        let rendered = catalog.to_json_pretty()?;

        match output {
            Some(target) => {
                fs::write(target, rendered)?;
                eprintln!("Wrote catalog to {}", target.display());
            }
            None => println!("{rendered}"),
        }
        Ok(())
    }
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_params(
    object: &str,
    fields: &str,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    next_page: Option<&str>,
    page_size: Option<u32>,
) -> ReadParams {
    let selection = if fields.trim() == "*" {
        FieldSelection::All
    } else {
        FieldSelection::named(
            fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty()),
        )
    };

    let mut params = ReadParams::new(object, selection);
    params.since = since;
    params.until = until;
    if let Some(cursor) = next_page {
        params = params.next_page(cursor);
    }
    params.page_size = page_size;
    params
}

fn write_params(object: &str, record_id: Option<&str>, data: &str) -> Result<WriteParams> {
    let JsonValue::Object(record) = serde_json::from_str(data)? else {
        return Err(Error::config("--data must be a JSON object"));
    };
    Ok(match record_id {
        Some(id) => WriteParams::update(object, id, record),
        None => WriteParams::create(object, record),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_params_field_list() {
        let params = read_params("users", " id, Email ,", None, None, Some(""), Some(10));
        assert_eq!(params.fields, FieldSelection::named(["id", "Email"]));
        assert_eq!(params.next_page, None);
        assert_eq!(params.page_size, Some(10));
    }

    #[test]
    fn test_read_params_star_selects_everything() {
        let params = read_params("users", "*", None, None, Some("cursor"), None);
        assert_eq!(params.fields, FieldSelection::All);
        assert_eq!(params.next_page.as_deref(), Some("cursor"));
    }

    #[test]
    fn test_write_params_update_when_id_given() {
        let params = write_params("contacts", Some("42"), r#"{"name":"Ada"}"#).unwrap();
        assert_eq!(params.record_id.as_deref(), Some("42"));
        assert!(!params.record_data.is_empty());
    }

    #[test]
    fn test_write_params_rejects_non_object() {
        assert!(write_params("contacts", None, "[1,2]").is_err());
    }

    #[tokio::test]
    async fn test_schema_command_writes_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let openapi = dir.path().join("openapi.yaml");
        let output = dir.path().join("catalog.json");
        fs::write(
            &openapi,
            r#"
openapi: 3.0.0
paths:
  /widgets:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                type: object
                properties:
                  data:
                    type: array
                    items:
                      type: object
                      properties:
                        id: {type: string, readOnly: true}
"#,
        )
        .unwrap();

        let cli = Cli {
            config: None,
            provider: None,
            verbose: false,
            command: Commands::Schema {
                openapi: openapi.clone(),
                module: "root".to_string(),
                path: String::new(),
                output: Some(output.clone()),
            },
        };
        Runner::new(cli).run().await.unwrap();

        let catalog: SchemaCatalog =
            serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert!(catalog.modules["root"].objects.contains_key("widgets"));
    }

    #[tokio::test]
    async fn test_connector_needs_a_provider() {
        let cli = Cli {
            config: None,
            provider: None,
            verbose: false,
            command: Commands::Metadata {
                objects: vec!["users".to_string()],
            },
        };
        let err = Runner::new(cli).run().await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
