//! Connector descriptions and construction parameters

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::RateLimiterConfig;
use crate::registry::Support;
use crate::types::ModuleId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Module used when a provider exposes a single API surface
pub const ROOT_MODULE: &str = "root";

// ============================================================================
// Provider Info
// ============================================================================

/// Credential scheme a provider expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    None,
    ApiKey,
    Basic,
    Bearer,
    DualHeader,
    Oauth2,
    Oauth2ClientCredentials,
    /// Credentials travel inside the request body; configured as basic
    BodyCredentials,
}

impl AuthScheme {
    /// Whether `auth` can satisfy this scheme
    pub fn accepts(self, auth: &AuthConfig) -> bool {
        match (self, auth) {
            (AuthScheme::None, _) => true,
            (AuthScheme::ApiKey, AuthConfig::ApiKey { .. }) => true,
            (AuthScheme::Basic | AuthScheme::BodyCredentials, AuthConfig::Basic { .. }) => true,
            (AuthScheme::Bearer, AuthConfig::Bearer { .. }) => true,
            (AuthScheme::DualHeader, AuthConfig::DualHeader { .. }) => true,
            (AuthScheme::Oauth2, AuthConfig::Oauth2Refresh { .. } | AuthConfig::Bearer { .. }) => {
                true
            }
            (AuthScheme::Oauth2ClientCredentials, AuthConfig::Oauth2ClientCredentials { .. }) => {
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthScheme::None => "none",
            AuthScheme::ApiKey => "api_key",
            AuthScheme::Basic => "basic",
            AuthScheme::Bearer => "bearer",
            AuthScheme::DualHeader => "dual_header",
            AuthScheme::Oauth2 => "oauth2",
            AuthScheme::Oauth2ClientCredentials => "oauth2_client_credentials",
            AuthScheme::BodyCredentials => "body_credentials",
        };
        f.write_str(name)
    }
}

/// Where ListObjectMetadata answers come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataSource {
    Static,
    EndpointSample,
}

/// Static description of a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    /// May reference `{{ workspace }}` and `{{ metadata.* }}`
    pub base_url: &'static str,
    pub auth: AuthScheme,
    /// OAuth2 token endpoint template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<&'static str>,
    pub modules: &'static [&'static str],
    pub requires_workspace: bool,
    pub required_metadata: &'static [&'static str],
    /// Union of the verbs any object supports
    pub support: Support,
    pub metadata: MetadataSource,
}

impl ProviderInfo {
    pub fn default_module(&self) -> &'static str {
        self.modules.first().copied().unwrap_or(ROOT_MODULE)
    }
}

// ============================================================================
// Connector Params
// ============================================================================

/// HTTP client settings of one connector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            rate_limit: None,
        }
    }
}

/// Everything a caller supplies to build a connector
#[derive(Debug, Clone, Default)]
pub struct ConnectorParams {
    pub workspace: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub auth: AuthConfig,
    /// Replaces the provider's base URL
    pub base_url: Option<String>,
    pub module: Option<ModuleId>,
    pub http: HttpSettings,
}

impl ConnectorParams {
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            auth,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn module(mut self, module: impl Into<ModuleId>) -> Self {
        self.module = Some(module.into());
        self
    }

    #[must_use]
    pub fn http(mut self, http: HttpSettings) -> Self {
        self.http = http;
        self
    }
}

/// Parameters after provider info resolution
///
/// Templates are rendered, the module is known to the provider, and the
/// credentials match its scheme.
#[derive(Debug, Clone)]
pub struct ResolvedParams {
    pub base_url: String,
    pub module: ModuleId,
    pub auth: AuthConfig,
    pub workspace: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub http: HttpSettings,
}

impl ResolvedParams {
    /// Metadata entry the provider declared as required
    pub fn required_metadata(&self, key: &str) -> Result<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::missing_field(format!("metadata.{key}")))
    }
}
