//! Applies one credential policy to outgoing requests
//!
//! OAuth2 access tokens are fetched lazily and shared by every request made
//! through the same connector. Refresh tokens rotated by the provider replace
//! the configured one for the lifetime of the authenticator.

use super::types::{AuthConfig, CachedToken, Location};
use crate::error::{Error, ErrorKind, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct TokenState {
    access: Option<CachedToken>,
    /// Set once the provider hands out a replacement refresh token
    rotated_refresh: Option<String>,
}

impl TokenState {
    fn valid_token(&self) -> Option<String> {
        self.access
            .as_ref()
            .filter(|token| !token.is_expired())
            .map(|token| token.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug)]
pub struct Authenticator {
    config: AuthConfig,
    state: RwLock<TokenState>,
    http_client: Client,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Token requests go through `http_client`, sharing its timeout and TLS setup
    pub fn with_client(config: AuthConfig, http_client: Client) -> Self {
        let access = match &config {
            AuthConfig::Oauth2Refresh {
                access_token: Some(token),
                expires_at,
                ..
            } if !token.is_empty() => Some(CachedToken::new(token.clone(), *expires_at)),
            _ => None,
        };

        Self {
            config,
            state: RwLock::new(TokenState {
                access,
                rotated_refresh: None,
            }),
            http_client,
        }
    }

    pub fn scheme(&self) -> &'static str {
        self.config.scheme()
    }

    /// Attach credentials to `req`, fetching an access token first if needed
    pub async fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let req = match &self.config {
            AuthConfig::None => req,
            AuthConfig::ApiKey {
                location: Location::Header,
                header_name,
                prefix,
                value,
                ..
            } => req.header(
                header_name.as_deref().unwrap_or("Authorization"),
                prefixed(prefix.as_deref(), value),
            ),
            AuthConfig::ApiKey {
                location: Location::Query,
                query_param,
                prefix,
                value,
                ..
            } => req.query(&[(
                query_param.as_deref().unwrap_or("api_key"),
                prefixed(prefix.as_deref(), value),
            )]),
            AuthConfig::DualHeader {
                key_header,
                key_value,
                secret_header,
                secret_value,
            } => req
                .header(key_header.as_str(), key_value.as_str())
                .header(secret_header.as_str(), secret_value.as_str()),
            AuthConfig::Basic { username, password } => req.basic_auth(username, Some(password)),
            AuthConfig::Bearer { token } => req.bearer_auth(token),
            AuthConfig::Oauth2Refresh { .. } | AuthConfig::Oauth2ClientCredentials { .. } => {
                req.bearer_auth(self.access_token().await?)
            }
            AuthConfig::CustomHeaders { headers } => headers
                .iter()
                .fold(req, |req, (name, value)| req.header(name.as_str(), value.as_str())),
        };
        Ok(req)
    }

    /// Drop the cached access token; the next request fetches a new one
    pub async fn invalidate(&self) {
        self.state.write().await.access = None;
    }

    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.state.read().await.valid_token() {
            return Ok(token);
        }

        let mut state = self.state.write().await;
        // a concurrent request may have refreshed while this one waited
        if let Some(token) = state.valid_token() {
            return Ok(token);
        }

        let response = self.request_token(state.rotated_refresh.as_deref()).await?;
        if let Some(rotated) = response.refresh_token.filter(|t| !t.is_empty()) {
            debug!("Provider rotated the refresh token");
            state.rotated_refresh = Some(rotated);
        }

        let token = match response.expires_in {
            Some(secs) => CachedToken::expires_in(response.access_token, secs),
            None => CachedToken::new(response.access_token, None),
        };
        let value = token.token.clone();
        state.access = Some(token);
        Ok(value)
    }

    async fn request_token(&self, rotated_refresh: Option<&str>) -> Result<TokenResponse> {
        let (token_url, form) = match &self.config {
            AuthConfig::Oauth2ClientCredentials {
                token_url,
                client_id,
                client_secret,
                scopes,
                token_body,
            } => {
                let mut form = vec![
                    ("grant_type".to_string(), "client_credentials".to_string()),
                    ("client_id".to_string(), client_id.clone()),
                    ("client_secret".to_string(), client_secret.clone()),
                ];
                if !scopes.is_empty() {
                    form.push(("scope".to_string(), scopes.join(" ")));
                }
                form.extend(token_body.iter().map(|(k, v)| (k.clone(), v.clone())));
                (token_url, form)
            }
            AuthConfig::Oauth2Refresh {
                token_url,
                client_id,
                client_secret,
                refresh_token,
                ..
            } => {
                let refresh_token = rotated_refresh.unwrap_or(refresh_token);
                if refresh_token.is_empty() {
                    return Err(Error::TokenRefresh {
                        message: "access token expired and no refresh token is configured"
                            .to_string(),
                    });
                }
                let form = vec![
                    ("grant_type".to_string(), "refresh_token".to_string()),
                    ("client_id".to_string(), client_id.clone()),
                    ("client_secret".to_string(), client_secret.clone()),
                    ("refresh_token".to_string(), refresh_token.to_string()),
                ];
                (token_url, form)
            }
            other => {
                return Err(Error::auth(format!(
                    "{} credentials have no token endpoint",
                    other.scheme()
                )))
            }
        };

        debug!(token_url = %token_url, scheme = self.scheme(), "Requesting access token");
        let response = self
            .http_client
            .post(token_url.as_str())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("token endpoint answered {}: {body}", status.as_u16());
            return Err(match (status, &self.config) {
                // invalid_grant, revoked or unknown client
                (StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED, _) => {
                    Error::with_message(ErrorKind::AccessToken, message)
                }
                (_, AuthConfig::Oauth2Refresh { .. }) => Error::TokenRefresh { message },
                _ => Error::OAuth2 { message },
            });
        }

        Ok(response.json().await?)
    }
}

fn prefixed(prefix: Option<&str>, value: &str) -> String {
    format!("{}{value}", prefix.unwrap_or_default())
}
