//! Authenticated HTTP client
//!
//! Executes one attempt per request:
//! - Credentials are applied by the connector's `Authenticator`
//! - An optional governor throttle runs before each send
//! - Non-2xx responses are turned into typed errors by the installed
//!   `ErrorHandler`
//!
//! Nothing here retries. Callers inspect `Error::is_retryable()`.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::request::{HttpRequest, RequestBody};
use super::response::HttpResponse;
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use crate::interpreter::ErrorInterpreter;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Turns provider error responses into typed errors
pub trait ErrorHandler: Send + Sync {
    /// Classify a non-2xx response
    fn handle(&self, status: u16, headers: &HeaderMap, body: &[u8]) -> Error;

    /// Inspect a 2xx response for providers that report failures in the body
    fn inspect_success(&self, _response: &HttpResponse) -> Result<()> {
        Ok(())
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for relative request paths
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Throttle, disabled by default
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            rate_limit: None,
            default_headers: HashMap::new(),
            user_agent: format!("solidafy-connectors/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Enable the throttle
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Single-attempt client shared by all pipelines of a connector
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
    error_handler: Arc<dyn ErrorHandler>,
}

impl HttpClient {
    /// Create a client applying `auth` to every request
    pub fn new(config: HttpClientConfig, auth: AuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);
        let authenticator = Authenticator::with_client(auth, client.clone());

        Ok(Self {
            client,
            config,
            authenticator,
            rate_limiter,
            error_handler: Arc::new(ErrorInterpreter::default()),
        })
    }

    /// Replace the error handler
    #[must_use]
    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = handler;
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.config.base_url.as_deref()
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Check if the throttle is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Send one request. Non-2xx statuses become errors.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = self.resolve_url(&request.url);

        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self.client.request(request.method.into(), &url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        req = match request.body {
            Some(RequestBody::Json(body)) => req.json(&body),
            Some(RequestBody::Form(pairs)) => req.form(&pairs),
            Some(RequestBody::Raw {
                bytes,
                content_type,
            }) => req.header(CONTENT_TYPE, content_type).body(bytes),
            None => req,
        };

        req = self.authenticator.authorize(req).await?;

        debug!(method = ?request.method, %url, "Sending request");
        let response = req.send().await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        debug!(status, len = bytes.len(), "Received response");

        if !(200..300).contains(&status) {
            if status == 401 {
                self.authenticator.invalidate().await;
            }
            return Err(self.error_handler.handle(status, &headers, &bytes));
        }

        let response = HttpResponse::new(status, headers, bytes);
        self.error_handler.inspect_success(&response)?;
        Ok(response)
    }

    /// Build full URL from path
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("auth", &self.authenticator.scheme())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
