//! Tests for the built-in provider bindings

use super::*;
use crate::auth::AuthConfig;
use crate::connector::Connector;
use crate::error::ErrorKind;
use crate::pipeline::ReadHandler;
use crate::types::{
    DeleteParams, FieldSelection, JsonObject, JsonValue, ReadParams, ValueType, WriteParams,
};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;
use wiremock::matchers::{
    body_json, body_partial_json, body_string_contains, header, method, path, query_param,
    query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn basic() -> AuthConfig {
    AuthConfig::Basic {
        username: "user".to_string(),
        password: "secret".to_string(),
    }
}

fn bearer() -> AuthConfig {
    AuthConfig::Bearer {
        token: "tok".to_string(),
    }
}

fn dual() -> AuthConfig {
    AuthConfig::dual_header("X-Api-Key", "key", "X-Api-Password", "pass").unwrap()
}

fn connect(provider: Provider, auth: AuthConfig, server: &MockServer) -> GenericConnector {
    provider
        .connector(ConnectorParams::new(auth).base_url(server.uri()))
        .unwrap()
}

fn data(value: JsonValue) -> JsonObject {
    value.as_object().cloned().unwrap()
}

fn objects(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Registry of providers
// ============================================================================

#[test_case("aircall", Provider::Aircall)]
#[test_case("Braintree", Provider::Braintree)]
#[test_case("GROOVE", Provider::Groove)]
#[test_case("talkdesk", Provider::Talkdesk)]
fn test_provider_from_str(name: &str, expected: Provider) {
    assert_eq!(name.parse::<Provider>().unwrap(), expected);
}

#[test]
fn test_unknown_provider_is_config_error() {
    let err = "salesforce".parse::<Provider>().unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_every_provider_has_consistent_info() {
    for provider in Provider::ALL {
        let info = provider.info();
        assert_eq!(provider.to_string(), info.name);
        assert_eq!(info.default_module(), "root");
        assert!(!info.base_url.is_empty());
    }
}

#[test]
fn test_embedded_catalogs_load() {
    for provider in [Provider::Aircall, Provider::Groove] {
        let store = provider.static_catalog().unwrap().unwrap();
        assert!(!store.object_names("root").is_empty());
    }
    assert!(Provider::Microsoft.static_catalog().is_none());
}

#[test]
fn test_talkdesk_requires_workspace_and_renders_token_url() {
    let auth = AuthConfig::Oauth2Refresh {
        token_url: String::new(),
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
        refresh_token: "refresh".to_string(),
        access_token: None,
        expires_at: None,
    };

    let err = Provider::Talkdesk
        .connector(ConnectorParams::new(auth.clone()))
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "workspace"));

    let resolved = ConnectorBuilder::new(
        Provider::Talkdesk.info(),
        ConnectorParams::new(auth).workspace("acme"),
    )
    .resolve()
    .unwrap();
    assert!(matches!(
        resolved.auth,
        AuthConfig::Oauth2Refresh { ref token_url, .. }
            if token_url == "https://acme.talkdeskid.com/oauth/token"
    ));
}

#[test]
fn test_credentials_must_match_provider_scheme() {
    let err = Provider::Groove
        .connector(ConnectorParams::new(basic()))
        .unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
}

// ============================================================================
// Aircall
// ============================================================================

#[tokio::test]
async fn test_aircall_calls_use_unix_second_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/calls"))
        .and(query_param("per_page", "50"))
        .and(query_param("from", "1704067200"))
        .and(query_param("to", "1706745599"))
        .and(header("authorization", "Basic dXNlcjpzZWNyZXQ="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "calls": [{"id": 1, "started_at": 1704067300}],
            "meta": {"next_page_link": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = ReadParams::new("calls", FieldSelection::All)
        .since(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        .until(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap());
    let result = connect(Provider::Aircall, basic(), &server)
        .read(params)
        .await
        .unwrap();

    assert_eq!(result.rows, 1);
    assert!(result.done);
}

#[tokio::test]
async fn test_aircall_static_metadata_is_pure() {
    // no mocks mounted: any request would fail
    let server = MockServer::start().await;
    let connector = connect(Provider::Aircall, basic(), &server);

    let first = connector
        .list_object_metadata(&objects(&["calls", "users", "voicemails"]))
        .await
        .unwrap();
    let second = connector
        .list_object_metadata(&objects(&["calls", "users", "voicemails"]))
        .await
        .unwrap();

    let direction = &first.result["calls"].fields["direction"];
    assert_eq!(direction.value_type, ValueType::SingleSelect);
    assert_eq!(direction.values.as_ref().map(Vec::len), Some(2));
    assert_eq!(first.result["users"].fields_map["email"], "Email");
    assert!(first.errors["voicemails"].is(ErrorKind::ObjectNotSupported));
    assert_eq!(first.result, second.result);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_aircall_update_methods_differ_per_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/contacts/7"))
        .and(body_json(json!({"first_name": "Ada"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contact": {"id": 7, "first_name": "Ada"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/tags/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tag": {"id": 3, "name": "vip"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connect(Provider::Aircall, basic(), &server);
    let contact = connector
        .write(WriteParams::update("contacts", "7", data(json!({"first_name": "Ada"}))))
        .await
        .unwrap();
    let tag = connector
        .write(WriteParams::update("tags", "3", data(json!({"name": "vip"}))))
        .await
        .unwrap();

    assert_eq!(contact.record_id.as_deref(), Some("7"));
    assert_eq!(tag.record_id.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_aircall_calls_are_read_only() {
    let server = MockServer::start().await;
    let connector = connect(Provider::Aircall, basic(), &server);

    let err = connector
        .write(WriteParams::create("calls", data(json!({"archived": true}))))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::OperationNotSupportedForObject));

    let err = connector
        .delete(DeleteParams::new("users", "1"))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::OperationNotSupportedForObject));
}

// ============================================================================
// Groove
// ============================================================================

#[tokio::test]
async fn test_groove_full_page_advances_page_number() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/tickets"))
        .and(query_param("perPage", "2"))
        .and(query_param_is_missing("page"))
        .and(header("x-api-key", "key"))
        .and(header("x-api-password", "pass"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "t1"}, {"id": "t2"}]
        })))
        .mount(&server)
        .await;

    let result = connect(Provider::Groove, dual(), &server)
        .read(ReadParams::new("tickets", FieldSelection::named(["id"])).page_size(2))
        .await
        .unwrap();

    assert!(!result.done);
    assert_eq!(
        result.next_page,
        Some(format!("{}/v2/tickets?page=2&perPage=2", server.uri()))
    );
}

#[tokio::test]
async fn test_groove_short_page_is_done() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/tickets"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "t3"}]
        })))
        .mount(&server)
        .await;

    let cursor = format!("{}/v2/tickets?page=2&perPage=2", server.uri());
    let result = connect(Provider::Groove, dual(), &server)
        .read(
            ReadParams::new("tickets", FieldSelection::All)
                .page_size(2)
                .next_page(cursor),
        )
        .await
        .unwrap();

    assert_eq!(result.rows, 1);
    assert!(result.done);
}

#[tokio::test]
async fn test_groove_contact_metadata_merges_custom_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/custom-fields"))
        .and(query_param("object", "contacts"))
        .and(header("x-api-key", "key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"key": "plan", "label": "Plan", "type": "dropdown", "options": ["free", "pro"]},
                {"key": "seats", "label": "Seats", "type": "number"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connect(Provider::Groove, dual(), &server);
    let result = connector
        .list_object_metadata(&objects(&["contacts", "tickets"]))
        .await
        .unwrap();
    connector
        .list_object_metadata(&objects(&["contacts"]))
        .await
        .unwrap();

    let contacts = &result.result["contacts"];
    assert_eq!(contacts.fields["plan"].value_type, ValueType::SingleSelect);
    assert_eq!(contacts.fields["plan"].values.as_ref().map(Vec::len), Some(2));
    assert_eq!(contacts.fields["seats"].value_type, ValueType::Float);
    assert_eq!(contacts.fields_map["email"], "Email");
    assert!(!result.result["tickets"].fields.contains_key("plan"));
}

#[tokio::test]
async fn test_groove_custom_field_failure_lands_in_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/custom-fields"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "nope"})))
        .mount(&server)
        .await;

    let result = connect(Provider::Groove, dual(), &server)
        .list_object_metadata(&objects(&["contacts", "mailboxes"]))
        .await
        .unwrap();

    assert!(result.errors["contacts"].is(ErrorKind::ResolvingCustomFields));
    assert!(result.result.contains_key("mailboxes"));
}

#[tokio::test]
async fn test_groove_contact_update_patches() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v2/contacts/c1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = connect(Provider::Groove, dual(), &server)
        .write(WriteParams::update("contacts", "c1", data(json!({"name": "Ada"}))))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.record_id.as_deref(), Some("c1"));
}

// ============================================================================
// Braintree
// ============================================================================

#[tokio::test]
async fn test_braintree_continues_from_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("braintree-version", "2019-01-01"))
        .and(body_partial_json(json!({"variables": {"first": 10, "after": "abc"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"search": {"transactions": {
                "pageInfo": {"hasNextPage": false, "endCursor": "def"},
                "edges": [{"node": {"id": "tx1", "status": "SETTLED"}}]
            }}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = connect(Provider::Braintree, basic(), &server)
        .read(
            ReadParams::new("transactions", FieldSelection::named(["status"]))
                .page_size(10)
                .next_page("abc"),
        )
        .await
        .unwrap();

    assert!(result.done);
    assert_eq!(result.data[0].fields, data(json!({"status": "SETTLED"})));
}

#[tokio::test]
async fn test_braintree_graphql_errors_are_bad_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"message": "Variable 'first' has an invalid value"}]
        })))
        .mount(&server)
        .await;

    let err = connect(Provider::Braintree, basic(), &server)
        .read(ReadParams::new("customers", FieldSelection::All))
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::BadRequest));
    assert_eq!(
        err.provider_message(),
        Some("Variable 'first' has an invalid value")
    );
}

#[tokio::test]
async fn test_braintree_create_customer_returns_node_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("createCustomer"))
        .and(body_partial_json(json!({
            "variables": {"input": {"customer": {"email": "a@example.com"}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"createCustomer": {"customer": {"id": "Y3VzdG9tZXJfMQ", "email": "a@example.com"}}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = connect(Provider::Braintree, basic(), &server)
        .write(WriteParams::create("customers", data(json!({"email": "a@example.com"}))))
        .await
        .unwrap();

    assert_eq!(result.record_id.as_deref(), Some("Y3VzdG9tZXJfMQ"));
    assert_eq!(
        result.data.as_ref().and_then(|d| d.get("email")),
        Some(&json!("a@example.com"))
    );
}

// ============================================================================
// Microsoft Graph
// ============================================================================

fn january() -> ReadParams {
    ReadParams::new("me/events", FieldSelection::named(["id"]))
        .since(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        .until(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
}

#[tokio::test]
async fn test_microsoft_accepted_filter_goes_upstream() {
    let server = MockServer::start().await;
    let filter = "lastModifiedDateTime ge 2024-01-01T00:00:00Z \
                  and lastModifiedDateTime lt 2024-02-01T00:00:00Z";
    Mock::given(method("GET"))
        .and(path("/me/events"))
        .and(header("prefer", "odata.maxpagesize=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/events"))
        .and(query_param("$filter", filter))
        .and(header("prefer", "odata.maxpagesize=100"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "e1", "lastModifiedDateTime": "2023-06-01T00:00:00Z"}],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/me/events?$skiptoken=x"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = connect(Provider::Microsoft, bearer(), &server)
        .read(january())
        .await
        .unwrap();

    // provider-side filtering: records are trusted as returned
    assert_eq!(result.rows, 1);
    assert_eq!(
        result.next_page.as_deref(),
        Some("https://graph.microsoft.com/v1.0/me/events?$skiptoken=x")
    );
}

#[tokio::test]
async fn test_microsoft_rejected_filter_falls_back_to_local_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/events"))
        .and(header("prefer", "odata.maxpagesize=1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": "BadRequest", "message": "Unsupported filter"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/events"))
        .and(query_param_is_missing("$filter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"id": "old", "lastModifiedDateTime": "2023-12-31T23:59:59Z"},
                {"id": "in", "lastModifiedDateTime": "2024-01-15T10:00:00Z"},
                {"id": "late", "lastModifiedDateTime": "2024-02-01T00:00:00Z"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = connect(Provider::Microsoft, bearer(), &server)
        .read(january())
        .await
        .unwrap();

    assert_eq!(result.rows, 1);
    assert_eq!(result.data[0].id.as_deref(), Some("in"));
}

#[tokio::test]
async fn test_microsoft_fallback_window_holds_on_later_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/events"))
        .and(header("prefer", "odata.maxpagesize=1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": "BadRequest", "message": "Unsupported filter"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/events"))
        .and(query_param_is_missing("$skiptoken"))
        .and(header("prefer", "odata.maxpagesize=100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "in", "lastModifiedDateTime": "2024-01-15T10:00:00Z"}],
            "@odata.nextLink": format!("{}/me/events?$skiptoken=p2", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/events"))
        .and(query_param("$skiptoken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"id": "old2", "lastModifiedDateTime": "2023-06-01T00:00:00Z"},
                {"id": "in2", "lastModifiedDateTime": "2024-01-20T00:00:00Z"},
                {"id": "late2", "lastModifiedDateTime": "2025-01-01T00:00:00Z"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connect(Provider::Microsoft, bearer(), &server);
    let first = connector.read(january()).await.unwrap();
    assert_eq!(first.rows, 1);
    let next = first.next_page.clone().unwrap();

    let second = connector.read(january().next_page(next)).await.unwrap();
    let ids: Vec<_> = second.data.iter().map(|row| row.id.as_deref()).collect();
    assert_eq!(ids, vec![Some("in2")]);
    assert!(second.done);
}

#[test_case("https://graph.microsoft.com/v1.0/me/events?$filter=x&$skiptoken=a", true ; "filter kept")]
#[test_case("https://graph.microsoft.com/v1.0/me/events?$skiptoken=a", false ; "filter dropped")]
#[test_case("not a url", false ; "unparseable")]
fn test_microsoft_cursor_filter_detection(next_page: &str, expected: bool) {
    let handler = microsoft::GraphHandler {
        base_url: "https://graph.microsoft.com/v1.0".to_string(),
    };
    assert_eq!(handler.cursor_keeps_time_filter(next_page), expected);
}

#[tokio::test]
async fn test_microsoft_bad_request_keeps_graph_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": "Request_BadRequest", "message": "Property 'mail' is read-only"}
        })))
        .mount(&server)
        .await;

    let err = connect(Provider::Microsoft, bearer(), &server)
        .write(WriteParams::create("users", data(json!({"mail": "a@example.com"}))))
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::BadRequest));
    assert_eq!(err.provider_message(), Some("Property 'mail' is read-only"));
}

#[tokio::test]
async fn test_microsoft_messages_can_be_deleted_but_not_written() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/me/messages/m1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connect(Provider::Microsoft, bearer(), &server);
    let deleted = connector
        .delete(DeleteParams::new("me/messages", "m1"))
        .await
        .unwrap();
    assert!(deleted.success);

    let err = connector
        .write(WriteParams::create("me/messages", data(json!({"subject": "hi"}))))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::OperationNotSupportedForObject));
}

#[tokio::test]
async fn test_record_id_stays_inside_its_segment() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/me/messages/m1%3Fforce=true%23x"))
        .and(query_param_is_missing("force"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let deleted = connect(Provider::Microsoft, bearer(), &server)
        .delete(DeleteParams::new("me/messages", "m1?force=true#x"))
        .await
        .unwrap();
    assert!(deleted.success);
}

// ============================================================================
// LinkedIn
// ============================================================================

#[tokio::test]
async fn test_linkedin_token_pagination_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/adAccounts"))
        .and(query_param("q", "search"))
        .and(query_param("pageSize", "100"))
        .and(header("linkedin-version", "202504"))
        .and(header("x-restli-protocol-version", "2.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [{"id": 501, "name": "Brand"}],
            "metadata": {"nextPageToken": "t2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = connect(Provider::Linkedin, bearer(), &server)
        .read(ReadParams::new("adAccounts", FieldSelection::All))
        .await
        .unwrap();

    assert_eq!(
        result.next_page,
        Some(format!(
            "{}/adAccounts?pageSize=100&pageToken=t2&q=search",
            server.uri()
        ))
    );
}

#[tokio::test]
async fn test_linkedin_absent_token_is_done() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/adAccounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [{"id": 501}],
            "metadata": {}
        })))
        .mount(&server)
        .await;

    let result = connect(Provider::Linkedin, bearer(), &server)
        .read(ReadParams::new("adAccounts", FieldSelection::All))
        .await
        .unwrap();

    assert!(result.done);
}

#[tokio::test]
async fn test_linkedin_create_reads_restli_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/adAccounts"))
        .respond_with(
            ResponseTemplate::new(201).insert_header("x-restli-id", "urn:li:sponsoredAccount:9"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = connect(Provider::Linkedin, bearer(), &server)
        .write(WriteParams::create("adAccounts", data(json!({"name": "Brand"}))))
        .await
        .unwrap();

    assert_eq!(result.record_id.as_deref(), Some("urn:li:sponsoredAccount:9"));
}

#[tokio::test]
async fn test_linkedin_update_is_partial() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/adAccounts/9"))
        .and(header("x-restli-method", "PARTIAL_UPDATE"))
        .and(body_json(json!({"patch": {"$set": {"name": "Renamed"}}})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = connect(Provider::Linkedin, bearer(), &server)
        .write(WriteParams::update("adAccounts", "9", data(json!({"name": "Renamed"}))))
        .await
        .unwrap();

    assert_eq!(result.record_id.as_deref(), Some("9"));
}

// ============================================================================
// Expensify
// ============================================================================

#[tokio::test]
async fn test_expensify_reads_policies_with_body_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("requestJobDescription="))
        .and(body_string_contains("partnerUserSecret"))
        .and(body_string_contains("policyList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responseCode": 200,
            "policyList": [{"id": "P1", "name": "Travel"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = connect(Provider::Expensify, basic(), &server)
        .read(ReadParams::new("policies", FieldSelection::named(["name"])))
        .await
        .unwrap();

    assert_eq!(result.rows, 1);
    assert!(result.done);

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_expensify_embedded_failure_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responseCode": 401,
            "responseMessage": "Authentication error"
        })))
        .mount(&server)
        .await;

    let err = connect(Provider::Expensify, basic(), &server)
        .read(ReadParams::new("policies", FieldSelection::All))
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::AccessToken));
    assert_eq!(err.provider_message(), Some("Authentication error"));
}

#[tokio::test]
async fn test_expensify_creates_expense() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("transactionList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responseCode": 200,
            "transactionList": [{"transactionID": "8839", "amount": 1200}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connect(Provider::Expensify, basic(), &server);
    let result = connector
        .write(WriteParams::create(
            "expenses",
            data(json!({"employeeEmail": "a@example.com", "amount": 1200, "currency": "USD"})),
        ))
        .await
        .unwrap();
    assert_eq!(result.record_id.as_deref(), Some("8839"));

    let err = connector
        .write(WriteParams::create("expenses", data(json!({"amount": 1}))))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::MissingRecordData));
}

// ============================================================================
// Talkdesk
// ============================================================================

#[tokio::test]
async fn test_talkdesk_reads_embedded_collection() {
    let server = MockServer::start().await;
    let next = format!("{}/ring-groups?page=2&per_page=50", server.uri());
    Mock::given(method("GET"))
        .and(path("/ring-groups"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"ring_groups": [{"id": "rg1", "name": "Sales"}]},
            "_links": {"next": {"href": next}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = Provider::Talkdesk
        .connector(
            ConnectorParams::new(bearer())
                .workspace("acme")
                .base_url(server.uri()),
        )
        .unwrap();
    let result = connector
        .read(ReadParams::new("ring-groups", FieldSelection::named(["name"])))
        .await
        .unwrap();

    assert_eq!(result.data[0].fields, data(json!({"name": "Sales"})));
    assert_eq!(result.next_page.as_deref(), Some(next.as_str()));
}
