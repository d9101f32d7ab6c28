//! HTTP client module
//!
//! Provides the authenticated, single-attempt HTTP client used by every
//! connector pipeline.
//!
//! # Features
//!
//! - **Authentication**: Credentials applied per request by the auth module
//! - **Error Handling**: Pluggable `ErrorHandler` classifies error responses
//! - **Buffered Responses**: JSON body parsed lazily and cached
//! - **Rate Limiting**: Optional token bucket throttle using governor

mod client;
mod rate_limit;
mod request;
mod response;

pub use client::{ErrorHandler, HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use request::{HttpRequest, RequestBody};
pub use response::HttpResponse;

#[cfg(test)]
mod tests;
