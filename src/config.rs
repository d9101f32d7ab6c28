//! Connector configuration files
//!
//! A config file names a provider and carries everything needed to build a
//! connector for it. Secrets are usually pulled from the environment with
//! `{{ env.NAME }}`; the raw YAML text is rendered before it is parsed.

use crate::auth::{AuthConfig, Location};
use crate::connector::{ConnectorParams, HttpSettings};
use crate::error::{Error, Result};
use crate::http::RateLimiterConfig;
use crate::providers::Provider;
use crate::template::{has_templates, render, TemplateContext};
use crate::types::ModuleId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Top-Level Config
// ============================================================================

/// One connector, as written in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub provider: Provider,

    #[serde(default)]
    pub module: Option<ModuleId>,

    #[serde(default)]
    pub workspace: Option<String>,

    /// Replaces the provider's base URL, mostly for tests and proxies
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

impl ConnectorConfig {
    /// Read and parse a config file, taking `env.*` from the process
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loading connector config");
        Self::parse(&raw, &TemplateContext::new())
    }

    /// Render `raw` with `ctx`, then parse it
    pub fn parse(raw: &str, ctx: &TemplateContext) -> Result<Self> {
        let rendered = if has_templates(raw) {
            render(raw, ctx)?
        } else {
            raw.to_string()
        };
        Ok(serde_yaml::from_str(&rendered)?)
    }

    /// Parameters for [`Provider::connector`]
    pub fn to_params(&self) -> Result<ConnectorParams> {
        Ok(ConnectorParams {
            workspace: self.workspace.clone(),
            metadata: self.metadata.clone(),
            auth: self.credentials.to_auth()?,
            base_url: self.base_url.clone(),
            module: self.module.clone(),
            http: self.http.to_settings(),
        })
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Credentials, tagged by `type`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsConfig {
    #[default]
    None,

    /// Key in a header (default `Authorization`) or in a query parameter
    ApiKey {
        key: String,
        #[serde(default)]
        header: Option<String>,
        #[serde(default)]
        query_param: Option<String>,
        #[serde(default)]
        prefix: Option<String>,
    },

    Basic {
        username: String,
        #[serde(default)]
        password: String,
    },

    Bearer {
        token: String,
    },

    DualHeader {
        key_header: String,
        key: String,
        secret_header: String,
        secret: String,
    },

    /// Authorization-code grant; the token URL defaults to the provider's
    Oauth2 {
        client_id: String,
        client_secret: String,
        #[serde(default)]
        refresh_token: String,
        #[serde(default)]
        access_token: Option<String>,
        #[serde(default)]
        token_url: Option<String>,
    },

    Oauth2ClientCredentials {
        client_id: String,
        client_secret: String,
        #[serde(default)]
        scopes: Vec<String>,
        #[serde(default)]
        token_url: Option<String>,
        #[serde(default)]
        token_body: HashMap<String, String>,
    },
}

impl CredentialsConfig {
    pub fn to_auth(&self) -> Result<AuthConfig> {
        let auth = match self.clone() {
            CredentialsConfig::None => AuthConfig::None,
            CredentialsConfig::ApiKey {
                key,
                header,
                query_param,
                prefix,
            } => {
                if header.is_some() && query_param.is_some() {
                    return Err(Error::config(
                        "api_key credentials take either header or query_param, not both",
                    ));
                }
                let location = if query_param.is_some() {
                    Location::Query
                } else {
                    Location::Header
                };
                AuthConfig::ApiKey {
                    location,
                    header_name: match location {
                        Location::Header => Some(header.unwrap_or_else(|| "Authorization".to_string())),
                        Location::Query => None,
                    },
                    query_param,
                    prefix,
                    value: key,
                }
            }
            CredentialsConfig::Basic { username, password } => {
                AuthConfig::Basic { username, password }
            }
            CredentialsConfig::Bearer { token } => AuthConfig::Bearer { token },
            CredentialsConfig::DualHeader {
                key_header,
                key,
                secret_header,
                secret,
            } => return AuthConfig::dual_header(key_header, key, secret_header, secret),
            CredentialsConfig::Oauth2 {
                client_id,
                client_secret,
                refresh_token,
                access_token,
                token_url,
            } => AuthConfig::Oauth2Refresh {
                token_url: token_url.unwrap_or_default(),
                client_id,
                client_secret,
                refresh_token,
                access_token,
                expires_at: None,
            },
            CredentialsConfig::Oauth2ClientCredentials {
                client_id,
                client_secret,
                scopes,
                token_url,
                token_body,
            } => AuthConfig::Oauth2ClientCredentials {
                token_url: token_url.unwrap_or_default(),
                client_id,
                client_secret,
                scopes,
                token_body,
            },
        };
        Ok(auth)
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: None,
            rate_limit: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl HttpConfig {
    pub fn to_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            rate_limit: self.rate_limit,
        }
    }
}
