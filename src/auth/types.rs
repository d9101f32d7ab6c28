//! Auth configuration types
//!
//! These types represent the runtime credential policy of a connector after
//! workspace and environment templates have been rendered.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Location for API key placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Place in HTTP header
    #[default]
    Header,
    /// Place in query parameter
    Query,
}

/// Credential injection policy, chosen once per connector
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Single API key (header or query)
    ApiKey {
        /// Where to place the API key
        location: Location,
        /// Header name (for header location)
        header_name: Option<String>,
        /// Query parameter name (for query location)
        query_param: Option<String>,
        /// Prefix to add before the value (e.g., "Bearer ")
        prefix: Option<String>,
        /// The API key value
        value: String,
    },

    /// Two named headers, both required (key + secret)
    DualHeader {
        key_header: String,
        key_value: String,
        secret_header: String,
        secret_value: String,
    },

    /// HTTP Basic authentication
    Basic {
        /// Username, possibly workspace-qualified
        username: String,
        /// Password
        password: String,
    },

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },

    /// OAuth2 authorization-code grant with refresh
    Oauth2Refresh {
        /// Token endpoint URL, already rendered for the workspace
        token_url: String,
        client_id: String,
        client_secret: String,
        refresh_token: String,
        /// Access token obtained out of band, used until it expires
        access_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    },

    /// OAuth2 Client Credentials flow
    Oauth2ClientCredentials {
        /// Token endpoint URL
        token_url: String,
        client_id: String,
        client_secret: String,
        /// Requested scopes
        scopes: Vec<String>,
        /// Additional token request body parameters
        token_body: HashMap<String, String>,
    },

    /// Custom headers
    CustomHeaders {
        /// Headers to add to each request
        headers: HashMap<String, String>,
    },
}

impl AuthConfig {
    /// Dual-header credentials; every part must be non-empty
    pub fn dual_header(
        key_header: impl Into<String>,
        key_value: impl Into<String>,
        secret_header: impl Into<String>,
        secret_value: impl Into<String>,
    ) -> Result<Self> {
        let config = Self::DualHeader {
            key_header: key_header.into(),
            key_value: key_value.into(),
            secret_header: secret_header.into(),
            secret_value: secret_value.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject credentials that cannot authenticate anything
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::DualHeader {
                key_header,
                key_value,
                secret_header,
                secret_value,
            } => {
                for (name, value) in [
                    ("key_header", key_header),
                    ("key", key_value),
                    ("secret_header", secret_header),
                    ("secret", secret_value),
                ] {
                    if value.is_empty() {
                        return Err(Error::missing_field(format!("credentials.{name}")));
                    }
                }
                Ok(())
            }
            Self::ApiKey { value, .. } if value.is_empty() => {
                Err(Error::missing_field("credentials.key"))
            }
            Self::Bearer { token } if token.is_empty() => {
                Err(Error::missing_field("credentials.token"))
            }
            Self::Oauth2Refresh {
                token_url,
                refresh_token,
                access_token,
                ..
            } => {
                if refresh_token.is_empty() && access_token.as_deref().unwrap_or("").is_empty() {
                    return Err(Error::missing_field("credentials.refresh_token"));
                }
                if token_url.is_empty() {
                    return Err(Error::missing_field("credentials.token_url"));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Short scheme name for listings
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey { .. } => "api_key",
            Self::DualHeader { .. } => "dual_header",
            Self::Basic { .. } => "basic",
            Self::Bearer { .. } => "bearer",
            Self::Oauth2Refresh { .. } => "oauth2",
            Self::Oauth2ClientCredentials { .. } => "oauth2_client_credentials",
            Self::CustomHeaders { .. } => "custom_headers",
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}
