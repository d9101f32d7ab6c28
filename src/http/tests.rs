//! Tests for the HTTP client module

use super::*;
use crate::auth::AuthConfig;
use crate::error::{Error, ErrorKind, Result};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder().base_url(server.uri()).build();
    HttpClient::new(config, AuthConfig::None).unwrap()
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_none());
    assert!(config.user_agent.starts_with("solidafy-connectors/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(60))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .rate_limit(RateLimiterConfig::new(5, 5))
        .build();

    assert_eq!(config.base_url, Some("https://api.example.com".to_string()));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");

    let client = HttpClient::new(config, AuthConfig::None).unwrap();
    assert!(client.has_rate_limiter());
}

#[test]
fn test_resolve_url() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com/")
        .build();
    let client = HttpClient::new(config, AuthConfig::None).unwrap();

    assert_eq!(
        client.resolve_url("/v1/users"),
        "https://api.example.com/v1/users"
    );
    assert_eq!(
        client.resolve_url("https://other.example.com/x"),
        "https://other.example.com/x"
    );
}

#[test]
fn test_request_builders() {
    let req = HttpRequest::post("/items")
        .header("X-Restli-Method", "PARTIAL_UPDATE")
        .json(serde_json::json!({"a": 1}));

    assert_eq!(req.header_value("x-restli-method"), Some("PARTIAL_UPDATE"));
    assert!(matches!(req.body, Some(RequestBody::Json(_))));
}

// ============================================================================
// Sending
// ============================================================================

#[tokio::test]
async fn test_send_get_parses_body_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("per_page", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "users": [{"id": 1, "name": "Alice"}]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .send(HttpRequest::get("/api/users?per_page=50"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let first = response.body().unwrap().unwrap() as *const _;
    let second = response.body().unwrap().unwrap() as *const _;
    assert_eq!(first, second);
    assert_eq!(response.body_required().unwrap()["users"][0]["name"], "Alice");
}

#[tokio::test]
async fn test_send_json_body_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/items"))
        .and(header("X-Request-Id", "req-456"))
        .and(header("X-Default", "yes"))
        .and(body_json(serde_json::json!({"name": "test"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 123})))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .header("X-Default", "yes")
        .build();
    let client = HttpClient::new(config, AuthConfig::None).unwrap();

    let response = client
        .send(
            HttpRequest::post("/api/items")
                .header("X-Request-Id", "req-456")
                .json(serde_json::json!({"name": "test"})),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_send_form_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("requestJobDescription=%7B%7D"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .send(HttpRequest::post("/jobs").form([("requestJobDescription", "{}")]))
        .await
        .unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn test_send_applies_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/secure"))
        .and(header("X-Api-Key", "k"))
        .and(header("X-Api-Password", "p"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder().base_url(mock_server.uri()).build();
    let auth = AuthConfig::dual_header("X-Api-Key", "k", "X-Api-Password", "p").unwrap();
    let client = HttpClient::new(config, auth).unwrap();

    let response = client.send(HttpRequest::get("/api/secure")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.body().unwrap().is_none());
    assert!(response.body_required().unwrap_err().is(ErrorKind::EmptyJsonHttpResponse));
}

#[tokio::test]
async fn test_error_status_is_classified_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.send(HttpRequest::get("/api/flaky")).await.unwrap_err();

    assert!(err.is(ErrorKind::Server));
    assert!(err.is_retryable());
    assert_eq!(err.provider_message(), Some("Service Unavailable"));
}

#[tokio::test]
async fn test_invalid_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.send(HttpRequest::get("/api/html")).await.unwrap();
    assert!(response.body().unwrap_err().is(ErrorKind::FailedToUnmarshalBody));
    assert_eq!(response.text(), "<html></html>");
}

struct TeapotHandler;

impl ErrorHandler for TeapotHandler {
    fn handle(&self, status: u16, _headers: &HeaderMap, _body: &[u8]) -> Error {
        Error::Other(format!("teapot {status}"))
    }

    fn inspect_success(&self, response: &HttpResponse) -> Result<()> {
        if response.header("x-fail").is_some() {
            return Err(Error::Other("body failure".to_string()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_custom_error_handler() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-fail", "1"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).with_error_handler(Arc::new(TeapotHandler));

    let err = client.send(HttpRequest::get("/a")).await.unwrap_err();
    assert_eq!(err.to_string(), "teapot 418");

    let err = client.send(HttpRequest::get("/b")).await.unwrap_err();
    assert_eq!(err.to_string(), "body failure");
}
