//! Schema subsystem tests

use super::*;
use crate::error::{ErrorKind, Result};
use crate::pagination::PaginationKind;
use crate::types::{JsonValue, ValueType};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const CATALOG: &str = r#"{
  "modules": {
    "root": {
      "id": "root",
      "path": "/v1",
      "objects": {
        "users": {
          "displayName": "Users",
          "path": "/users",
          "responseKey": "users",
          "pageSizeParam": "per_page",
          "pagination": "nextUrl",
          "fields": {
            "id": {"displayName": "ID", "valueType": "int", "providerType": "integer", "readOnly": true},
            "email": {"displayName": "Email", "valueType": "string", "providerType": "string"}
          }
        },
        "calls": {
          "displayName": "Calls",
          "path": "calls",
          "responseKey": "calls",
          "incrementalRead": true,
          "fields": ["id", "direction"]
        }
      }
    }
  }
}"#;

fn store() -> StaticSchemaStore {
    StaticSchemaStore::from_json(CATALOG).unwrap()
}

fn names(objects: &[&str]) -> Vec<String> {
    objects.iter().map(|s| (*s).to_string()).collect()
}

// ============================================================================
// Static Store
// ============================================================================

#[test]
fn test_lookups() {
    let store = store();
    assert_eq!(store.lookup_url_path("root", "users").unwrap(), "/v1/users");
    assert_eq!(store.lookup_url_path("root", "calls").unwrap(), "/v1/calls");
    assert_eq!(store.lookup_array_field_name("root", "calls").unwrap(), "calls");
    assert_eq!(store.lookup_page_size_param("root", "users"), Some("per_page"));
    assert_eq!(store.lookup_page_size_param("root", "calls"), None);
    assert_eq!(store.lookup_pagination_type("root", "users"), PaginationKind::NextUrl);
    assert_eq!(store.lookup_pagination_type("root", "calls"), PaginationKind::None);
    assert!(store.is_incremental_read("root", "calls"));
    assert!(!store.is_incremental_read("root", "users"));
    assert_eq!(
        store.object_names("root").into_iter().collect::<Vec<_>>(),
        names(&["calls", "users"])
    );
    assert!(store.object_names("helpcenter").is_empty());
}

#[test]
fn test_unknown_object_url_path() {
    let err = store().lookup_url_path("root", "tickets").unwrap_err();
    assert!(err.is(ErrorKind::ResolvingUrlPathForObject));
}

#[test]
fn test_select_collects_unknown_objects() {
    let result = store().select("root", &names(&["users", "tickets"])).unwrap();

    let users = &result.result["users"];
    assert_eq!(users.display_name, "Users");
    assert_eq!(users.fields["id"].value_type, ValueType::Int);
    assert!(users.fields["id"].read_only);
    assert!(users.is_consistent());

    assert!(result.errors["tickets"].is(ErrorKind::ObjectNotSupported));
}

#[test]
fn test_select_name_only_fields() {
    let result = store().select("root", &names(&["calls"])).unwrap();
    let calls = &result.result["calls"];
    assert!(calls.fields.is_empty());
    assert_eq!(calls.fields_map.len(), 2);
    assert_eq!(calls.fields_map["direction"], "direction");
}

#[test]
fn test_select_is_pure() {
    let store = store();
    let objects = names(&["users", "calls"]);
    let first = store.select("root", &objects).unwrap();
    let second = store.select("root", &objects).unwrap();
    assert_eq!(first.result, second.result);
}

#[test]
fn test_select_requires_objects() {
    let err = store().select("root", &[]).unwrap_err();
    assert!(err.is(ErrorKind::MissingObjects));
}

#[test]
fn test_module_id_mismatch() {
    let raw = r#"{"modules": {"root": {"id": "other", "objects": {}}}}"#;
    assert!(StaticSchemaStore::from_json(raw).is_err());
}

// ============================================================================
// Inference
// ============================================================================

#[test]
fn test_infer_json_types() {
    let record = json!({
        "name": "Ada",
        "age": 36,
        "active": true,
        "tags": ["a"],
        "address": {"city": "London"},
        "deleted_at": null,
        "created": "2024-01-15T10:30:00Z"
    });

    let metadata = MetadataInferrer::new().infer("custom-events", &record);
    assert_eq!(metadata.display_name, "Custom Events");
    assert_eq!(metadata.fields["name"].value_type, ValueType::String);
    assert_eq!(metadata.fields["age"].value_type, ValueType::Float);
    assert_eq!(metadata.fields["active"].value_type, ValueType::Boolean);
    assert_eq!(metadata.fields["tags"].value_type, ValueType::Other);
    assert_eq!(metadata.fields["address"].value_type, ValueType::Other);
    assert_eq!(metadata.fields["deleted_at"].value_type, ValueType::Other);
    assert_eq!(metadata.fields["created"].value_type, ValueType::String);
    assert!(metadata.is_consistent());
}

#[test]
fn test_infer_datetime_detection() {
    let record = json!({"created": "2024-01-15T10:30:00Z", "day": "2024-01-15"});
    let metadata = MetadataInferrer::new()
        .with_datetime_detection(true)
        .infer("calls", &record);
    assert_eq!(metadata.fields["created"].value_type, ValueType::DateTime);
    assert_eq!(metadata.fields["day"].value_type, ValueType::Date);
}

#[test]
fn test_infer_union_of_records() {
    let records = vec![
        json!({"id": 1, "owner": null}),
        json!({"id": 2, "owner": "ada", "extra": true}),
    ];
    let metadata = MetadataInferrer::new().infer_from_records("deals", &records);
    assert_eq!(metadata.fields.len(), 3);
    assert_eq!(metadata.fields["owner"].value_type, ValueType::String);
    assert_eq!(metadata.fields["extra"].value_type, ValueType::Boolean);
}

// ============================================================================
// OpenAPI
// ============================================================================

const OPENAPI: &str = r#"
openapi: 3.0.0
info: {title: Example, version: "1"}
paths:
  /v1/users:
    get:
      parameters:
        - {name: per_page, in: query, schema: {type: integer}}
        - $ref: '#/components/parameters/Since'
      responses:
        "200":
          content:
            application/json:
              schema:
                type: object
                properties:
                  users:
                    type: array
                    items: {$ref: '#/components/schemas/User'}
  /v1/users/{id}:
    get:
      responses:
        "200":
          content:
            application/json:
              schema: {$ref: '#/components/schemas/User'}
  /v1/tags:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                type: array
                items:
                  type: object
                  properties:
                    name: {type: string}
  /v1/health:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                type: object
                properties:
                  ok: {type: boolean}
components:
  parameters:
    Since: {name: since, in: query, schema: {type: string}}
  schemas:
    Base:
      type: object
      properties:
        id: {type: integer, readOnly: true}
        created_at: {type: string, format: date-time}
    User:
      allOf:
        - $ref: '#/components/schemas/Base'
        - type: object
          properties:
            email: {type: string, title: Email Address}
            score: {type: number}
            status: {type: string, enum: [active, disabled]}
            roles:
              type: array
              items: {type: string, enum: [admin, member]}
            birthday: {type: string, format: date}
            verified: {type: boolean}
            profile: {type: object}
"#;

#[test]
fn test_openapi_extraction() {
    let module = OpenApiExtractor::parse(OPENAPI)
        .unwrap()
        .extract("root", "/v1")
        .unwrap();

    assert_eq!(module.path, "/v1");
    assert_eq!(
        module.objects.keys().cloned().collect::<Vec<_>>(),
        names(&["tags", "users"])
    );

    let users = &module.objects["users"];
    assert_eq!(users.display_name, "Users");
    assert_eq!(users.path, "/users");
    assert_eq!(users.response_key, "users");
    assert_eq!(users.page_size_param.as_deref(), Some("per_page"));
    assert!(users.incremental_read);

    let FieldSet::Rich(fields) = &users.fields else {
        panic!("expected field metadata");
    };
    assert_eq!(fields["id"].value_type, ValueType::Int);
    assert!(fields["id"].read_only);
    assert_eq!(fields["created_at"].value_type, ValueType::DateTime);
    assert_eq!(fields["created_at"].provider_type, "string/date-time");
    assert_eq!(fields["email"].display_name, "Email Address");
    assert_eq!(fields["score"].value_type, ValueType::Float);
    assert_eq!(fields["status"].value_type, ValueType::SingleSelect);
    assert_eq!(fields["status"].values.as_ref().map(Vec::len), Some(2));
    assert_eq!(fields["roles"].value_type, ValueType::MultiSelect);
    assert_eq!(fields["birthday"].value_type, ValueType::Date);
    assert_eq!(fields["verified"].value_type, ValueType::Boolean);
    assert_eq!(fields["profile"].value_type, ValueType::Other);

    let tags = &module.objects["tags"];
    assert_eq!(tags.response_key, "");
    assert!(!tags.incremental_read);
}

#[test]
fn test_openapi_round_trips_through_store() {
    let module = OpenApiExtractor::parse(OPENAPI)
        .unwrap()
        .extract("root", "/v1")
        .unwrap();
    let mut catalog = SchemaCatalog::new();
    catalog.add_module(module);

    let store = StaticSchemaStore::from_json(&catalog.to_json_pretty().unwrap()).unwrap();
    assert_eq!(store.lookup_url_path("root", "users").unwrap(), "/v1/users");
}

#[test]
fn test_openapi_rejects_non_openapi() {
    assert!(OpenApiExtractor::parse("swagger: '2.0'").is_err());
}

#[test]
fn test_openapi_unresolved_ref() {
    let doc = json!({
        "openapi": "3.0.0",
        "paths": {"/items": {"get": {"responses": {"200": {"$ref": "#/components/responses/Missing"}}}}}
    });
    assert!(OpenApiExtractor::new(doc).extract("root", "").is_err());
}

// ============================================================================
// Metadata Strategies
// ============================================================================

#[derive(Default)]
struct FakeSampler {
    records: HashMap<String, JsonValue>,
    failing: bool,
    calls: AtomicUsize,
}

impl FakeSampler {
    fn with(mut self, object: &str, record: JsonValue) -> Self {
        self.records.insert(object.to_string(), record);
        self
    }
}

#[async_trait]
impl ObjectSampler for FakeSampler {
    async fn sample(&self, object_name: &str) -> Result<Option<JsonValue>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(ErrorKind::Server.into());
        }
        if object_name == "broken" {
            return Err(ErrorKind::Forbidden.into());
        }
        Ok(self.records.get(object_name).cloned())
    }
}

fn sampler() -> Arc<FakeSampler> {
    Arc::new(
        FakeSampler::default()
            .with("calls", json!({"id": 1, "direction": "inbound"}))
            .with("users", json!({"id": 2, "email": "a@b.c"})),
    )
}

#[tokio::test]
async fn test_endpoint_sample_parallel() {
    let provider = SchemaProvider::endpoint_sample(sampler());
    let result = provider
        .object_metadata(&names(&["calls", "users", "broken", "empty"]))
        .await
        .unwrap();

    assert_eq!(result.result.len(), 2);
    assert_eq!(result.result["calls"].fields["direction"].value_type, ValueType::String);
    assert!(result.errors["broken"].is(ErrorKind::Forbidden));
    assert!(result.errors["empty"].is(ErrorKind::MissingExpectedValues));
}

#[tokio::test]
async fn test_endpoint_sample_serial() {
    let provider = SchemaProvider::EndpointSample {
        sampler: sampler(),
        inferrer: MetadataInferrer::new(),
        mode: FetchMode::Serial,
    };
    let result = provider.object_metadata(&names(&["users"])).await.unwrap();
    assert_eq!(result.result["users"].display_name, "Users");
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_empty_object_list() {
    let provider = SchemaProvider::endpoint_sample(sampler());
    let err = provider.object_metadata(&[]).await.unwrap_err();
    assert!(err.is(ErrorKind::MissingObjects));
}

#[tokio::test]
async fn test_static_strategy_makes_no_calls() {
    let provider = SchemaProvider::static_schema(Arc::new(store()), "root");
    let result = provider.object_metadata(&names(&["users"])).await.unwrap();
    assert_eq!(result.result["users"].fields.len(), 2);
}

#[tokio::test]
async fn test_composite_first_success_is_terminal() {
    let fallback = sampler();
    let composite = SchemaProvider::Composite(vec![
        SchemaProvider::static_schema(Arc::new(store()), "root"),
        SchemaProvider::endpoint_sample(fallback.clone()),
    ]);

    let result = composite
        .object_metadata(&names(&["users", "unknown"]))
        .await
        .unwrap();

    assert!(result.result.contains_key("users"));
    assert!(result.errors["unknown"].is(ErrorKind::ObjectNotSupported));
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_composite_falls_through_failures() {
    let failing = Arc::new(FakeSampler {
        failing: true,
        ..FakeSampler::default()
    });
    let composite = SchemaProvider::Composite(vec![
        SchemaProvider::Composite(vec![]),
        SchemaProvider::endpoint_sample(failing),
        SchemaProvider::static_schema(Arc::new(store()), "root"),
    ]);

    // The empty composite fails outright; the sampler's failures are per object
    // and end the search before the static store is consulted.
    let result = composite.object_metadata(&names(&["calls"])).await.unwrap();
    assert!(result.result.is_empty());
    assert!(result.errors["calls"].is(ErrorKind::Server));
}

#[tokio::test]
async fn test_empty_composite_fails() {
    let err = SchemaProvider::Composite(vec![])
        .object_metadata(&names(&["calls"]))
        .await
        .unwrap_err();
    assert!(!err.is(ErrorKind::MissingObjects));
}

struct PanickingSampler;

#[async_trait]
impl ObjectSampler for PanickingSampler {
    async fn sample(&self, _object_name: &str) -> Result<Option<JsonValue>> {
        panic!("sampler bug");
    }
}

#[tokio::test]
#[should_panic(expected = "sampler bug")]
async fn test_parallel_panic_propagates() {
    let provider = SchemaProvider::endpoint_sample(Arc::new(PanickingSampler));
    let _ = provider.object_metadata(&names(&["calls"])).await;
}
