//! Error types for Solidafy Connectors
//!
//! Every public operation returns `Result<T, Error>`. Failures that callers
//! branch on carry an [`ErrorKind`] from a small closed taxonomy, optionally
//! wrapped with the provider's own human-readable message.

use std::fmt;
use thiserror::Error;

/// Closed set of failure kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    AccessToken,
    Forbidden,
    NotFound,
    Caller,
    Server,
    Retryable,
    RequestFailed,
    ObjectNotSupported,
    OperationNotSupportedForObject,
    MissingObjects,
    MissingFields,
    MissingRecordId,
    MissingRecordData,
    FailedToUnmarshalBody,
    MissingExpectedValues,
    EmptyJsonHttpResponse,
    ResolvingUrlPathForObject,
    ResolvingCustomFields,
}

impl ErrorKind {
    /// Human-readable description used as the error prefix.
    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad request",
            ErrorKind::AccessToken => "access token invalid",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not found",
            ErrorKind::Caller => "caller error",
            ErrorKind::Server => "server error",
            ErrorKind::Retryable => "retryable error",
            ErrorKind::RequestFailed => "request failed",
            ErrorKind::ObjectNotSupported => "object not supported",
            ErrorKind::OperationNotSupportedForObject => {
                "operation is not supported for this object in this module"
            }
            ErrorKind::MissingObjects => "no objects provided",
            ErrorKind::MissingFields => "no fields provided",
            ErrorKind::MissingRecordId => "no record id provided",
            ErrorKind::MissingRecordData => "no record data provided",
            ErrorKind::FailedToUnmarshalBody => "failed to unmarshal response body",
            ErrorKind::MissingExpectedValues => "response is missing expected values",
            ErrorKind::EmptyJsonHttpResponse => "empty json http response",
            ErrorKind::ResolvingUrlPathForObject => "cannot resolve url path for object",
            ErrorKind::ResolvingCustomFields => "cannot resolve custom fields",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// The main error type for Solidafy Connectors
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Connector Errors (taxonomy)
    // ============================================================================
    #[error("{kind}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Connector {
        kind: ErrorKind,
        message: Option<String>,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    #[error("OAuth2 error: {message}")]
    OAuth2 { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // JSON Navigation Errors
    // ============================================================================
    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Value at '{key}' is not an array")]
    NotArray { key: String },

    #[error("Value at '{key}' is not of type {expected}")]
    UnexpectedType { key: String, expected: &'static str },

    #[error("JSONPath error: {message}")]
    JsonPath { message: String },

    #[error("XML parsing error: {message}")]
    XmlParse { message: String },

    #[error("Cannot parse timestamp '{value}' in field '{field}'")]
    InvalidTimestamp { field: String, value: String },

    // ============================================================================
    // Schema and Registry Errors
    // ============================================================================
    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Endpoint registry error: {message}")]
    Registry { message: String },

    // ============================================================================
    // Template Errors
    // ============================================================================
    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::Connector {
            kind,
            message: None,
        }
    }
}

impl Error {
    /// Create a taxonomy error with a provider message
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Connector {
            kind,
            message: Some(message.into()),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a key-not-found error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a registry error
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// The taxonomy kind, if this error carries one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Connector { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Check whether this error is of the given kind
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Provider message attached to a taxonomy error
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            Error::Connector { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Check if the caller may retry this error with back-off
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Connector { kind, .. } => {
                matches!(kind, ErrorKind::Retryable | ErrorKind::Server)
            }
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Result type alias for Solidafy Connectors
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(message.into(), e.into()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| wrap(f(), e.into()))
    }
}

/// Taxonomy errors keep their kind when context is added.
fn wrap(context: String, inner: Error) -> Error {
    match inner {
        Error::Connector { kind, message } => Error::Connector {
            kind,
            message: Some(match message {
                Some(m) => format!("{context}: {m}"),
                None => context,
            }),
        },
        other => Error::Other(format!("{context}: {other}")),
    }
}
