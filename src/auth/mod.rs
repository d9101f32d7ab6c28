//! Authentication module
//!
//! Supports: API Key, Dual Header, Basic, Bearer, OAuth2 (refresh token and
//! client credentials), Custom Headers
//!
//! The `Authenticator` applies one credential policy to every request and
//! caches OAuth2 access tokens until shortly before they expire.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, CachedToken, Location};
