//! Groove: dual-header credentials, page-number pagination with bracketed
//! query filters, and per-account custom fields on contacts

use super::{catalog, load_catalog, CatalogCell};
use crate::connector::{
    AuthScheme, CustomFieldSource, CustomFields, MetadataSource, ProviderBinding, ProviderInfo,
    ResolvedParams, ROOT_MODULE,
};
use crate::error::Result;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::incremental::{TimeFieldSpec, TimestampLayout};
use crate::pagination::OffsetPagePaginator;
use crate::pipeline::{
    parse_page, DeleteContext, DeleteHandler, ReadContext, ReadHandler, ReadPage, RecordLocator,
    WriteContext, WriteHandler, WriteMethod,
};
use crate::registry::{EndpointEntry, Support};
use crate::schema::{SchemaProvider, StaticSchemaStore};
use crate::types::{
    FieldMetadata, FieldValue, JsonValue, Method, ModuleId, ValueType, WriteResult,
};
use crate::urlbuilder::{UrlBuilder, QUERY_ENCODING_EXCEPTIONS};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;

pub(super) const INFO: ProviderInfo = ProviderInfo {
    name: "groove",
    display_name: "Groove",
    base_url: "https://api.groovehq.com",
    auth: AuthScheme::DualHeader,
    token_url: None,
    modules: &[ROOT_MODULE],
    requires_workspace: false,
    required_metadata: &[],
    support: Support::ALL,
    metadata: MetadataSource::Static,
};

pub(super) static CATALOG: CatalogCell =
    LazyLock::new(|| load_catalog(include_str!("../../schemas/groove.json")));

const DEFAULT_PAGE_SIZE: u32 = 50;
const CREATED_ON: &str = "createdOn";

pub(super) fn binding(resolved: &ResolvedParams) -> Result<Box<dyn ProviderBinding>> {
    Ok(Box::new(Groove {
        base_url: resolved.base_url.clone(),
        store: catalog(&CATALOG)?,
    }))
}

struct Groove {
    base_url: String,
    store: Arc<StaticSchemaStore>,
}

impl Groove {
    fn handler(&self) -> Arc<GrooveHandler> {
        Arc::new(GrooveHandler {
            base_url: self.base_url.clone(),
            store: Arc::clone(&self.store),
        })
    }
}

impl ProviderBinding for Groove {
    fn endpoints(&self) -> BTreeMap<ModuleId, Vec<EndpointEntry>> {
        BTreeMap::from([(
            ROOT_MODULE.to_string(),
            vec![
                EndpointEntry::new("contacts", Support::ALL),
                EndpointEntry::new("custom-events", Support::READ.with_write()),
                EndpointEntry::new("{tickets,mailboxes}", Support::READ),
            ],
        )])
    }

    fn read_handler(&self) -> Option<Arc<dyn ReadHandler>> {
        Some(self.handler() as Arc<dyn ReadHandler>)
    }

    fn write_handler(&self) -> Option<Arc<dyn WriteHandler>> {
        Some(self.handler() as Arc<dyn WriteHandler>)
    }

    fn delete_handler(&self) -> Option<Arc<dyn DeleteHandler>> {
        Some(self.handler() as Arc<dyn DeleteHandler>)
    }

    fn schema_provider(&self, _client: &Arc<HttpClient>, module: &str) -> SchemaProvider {
        SchemaProvider::static_schema(Arc::clone(&self.store), module)
    }

    fn custom_fields(&self, client: &Arc<HttpClient>) -> Option<Arc<dyn CustomFieldSource>> {
        Some(Arc::new(GrooveCustomFields {
            client: Arc::clone(client),
            base_url: self.base_url.clone(),
        }))
    }
}

/// One handler serves all three verbs; they share the catalog paths
struct GrooveHandler {
    base_url: String,
    store: Arc<StaticSchemaStore>,
}

impl GrooveHandler {
    fn object_url(&self, module: &str, object: &str) -> Result<UrlBuilder> {
        let path = self.store.lookup_url_path(module, object)?;
        UrlBuilder::new(&self.base_url, &[path.as_str()])
    }
}

// ============================================================================
// Read
// ============================================================================

impl ReadHandler for GrooveHandler {
    fn build_request(&self, ctx: &ReadContext<'_>) -> Result<HttpRequest> {
        if let Some(next) = ctx.next_page() {
            return Ok(HttpRequest::get(next));
        }

        let mut url = self.object_url(ctx.module, ctx.object())?;
        url.add_encoding_exceptions(&QUERY_ENCODING_EXCEPTIONS);

        if let Some(size) = ctx.page_size {
            let param = self
                .store
                .lookup_page_size_param(ctx.module, ctx.object())
                .unwrap_or("perPage");
            url.with_query_param(param, size.to_string());
        }

        if ctx.provider_side {
            let layout = TimestampLayout::Rfc3339;
            if let Some(since) = ctx.params.since {
                url.with_query_param("query[createdOn][from]", layout.format(since));
            }
            if let Some(until) = ctx.params.until {
                url.with_query_param("query[createdOn][to]", layout.format(until));
            }
        }

        Ok(HttpRequest::get(url.to_string()))
    }

    fn parse_response(
        &self,
        ctx: &ReadContext<'_>,
        request_url: &str,
        response: &HttpResponse,
    ) -> Result<ReadPage> {
        let key = self.store.lookup_array_field_name(ctx.module, ctx.object())?;
        let paginator =
            OffsetPagePaginator::new("page", 1).with_encoding_exceptions(&QUERY_ENCODING_EXCEPTIONS);
        parse_page(&RecordLocator::key(&[key]), &paginator, ctx, request_url, response)
    }

    fn time_field(&self, _module: &str, object: &str) -> Option<TimeFieldSpec> {
        match object {
            "contacts" => Some(TimeFieldSpec::provider_side().with_timestamp_field(CREATED_ON)),
            "custom-events" => Some(TimeFieldSpec::connector_side(CREATED_ON)),
            _ => None,
        }
    }

    fn default_page_size(&self, _object: &str) -> Option<u32> {
        Some(DEFAULT_PAGE_SIZE)
    }
}

// ============================================================================
// Write / Delete
// ============================================================================

impl WriteHandler for GrooveHandler {
    fn build_request(&self, ctx: &WriteContext<'_>) -> Result<HttpRequest> {
        let mut url = self.object_url(ctx.module, ctx.object)?;
        let body = JsonValue::Object(ctx.object_data()?);

        let request = match ctx.method {
            WriteMethod::Create => HttpRequest::post(url.to_string()),
            WriteMethod::Update(id) => {
                HttpRequest::new(Method::PATCH, url.add_segment(id).to_string())
            }
        };
        Ok(request.json(body))
    }

    /// Created records come back wrapped in `data`
    fn parse_response(&self, ctx: &WriteContext<'_>, response: &HttpResponse) -> Result<WriteResult> {
        let created = response
            .body()
            .ok()
            .flatten()
            .and_then(|body| body.get("data"))
            .and_then(JsonValue::as_object)
            .cloned();
        let record_id = created
            .as_ref()
            .and_then(|record| match record.get("id") {
                Some(JsonValue::String(s)) => Some(s.clone()),
                Some(JsonValue::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .or_else(|| ctx.record_id().map(String::from));
        Ok(WriteResult::success(record_id, created))
    }
}

impl DeleteHandler for GrooveHandler {
    fn build_request(&self, ctx: &DeleteContext<'_>) -> Result<HttpRequest> {
        let mut url = self.object_url(ctx.module, ctx.object)?;
        Ok(HttpRequest::delete(url.add_segment(ctx.record_id).to_string()))
    }
}

// ============================================================================
// Custom fields
// ============================================================================

#[derive(Debug, Deserialize)]
struct CustomFieldList {
    #[serde(default)]
    data: Vec<CustomFieldDefinition>,
}

#[derive(Debug, Deserialize)]
struct CustomFieldDefinition {
    key: String,
    label: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    options: Vec<String>,
}

impl CustomFieldDefinition {
    fn into_metadata(self) -> (String, FieldMetadata) {
        let value_type = match self.field_type.as_str() {
            "text" | "email" | "url" | "phone" => ValueType::String,
            "number" => ValueType::Float,
            "checkbox" | "boolean" => ValueType::Boolean,
            "date" => ValueType::Date,
            "dropdown" => ValueType::SingleSelect,
            "multiselect" => ValueType::MultiSelect,
            _ => ValueType::Other,
        };

        let mut field =
            FieldMetadata::new(self.label, value_type).with_provider_type(self.field_type);
        if matches!(value_type, ValueType::SingleSelect | ValueType::MultiSelect) {
            field = field.with_values(
                self.options
                    .into_iter()
                    .map(|option| FieldValue::new(option.clone(), option))
                    .collect(),
            );
        }
        (self.key, field)
    }
}

struct GrooveCustomFields {
    client: Arc<HttpClient>,
    base_url: String,
}

#[async_trait]
impl CustomFieldSource for GrooveCustomFields {
    fn applies_to(&self, object: &str) -> bool {
        object == "contacts"
    }

    async fn fetch(&self, object: &str) -> Result<CustomFields> {
        let mut url = UrlBuilder::new(&self.base_url, &["v2", "custom-fields"])?;
        url.with_query_param("object", object);

        let response = self.client.send(HttpRequest::get(url.to_string())).await?;
        let list: CustomFieldList = serde_json::from_value(response.body_required()?.clone())?;
        debug!(object, fields = list.data.len(), "Fetched custom fields");

        Ok(list
            .data
            .into_iter()
            .map(CustomFieldDefinition::into_metadata)
            .collect())
    }
}
