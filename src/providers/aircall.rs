//! Aircall: REST with basic auth, `meta.next_page_link` cursors and unix-second
//! time filters on calls

use super::{catalog, load_catalog, CatalogCell};
use crate::connector::{
    AuthScheme, MetadataSource, ProviderBinding, ProviderInfo, ResolvedParams, ROOT_MODULE,
};
use crate::error::Result;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::incremental::{TimeFieldSpec, TimestampLayout};
use crate::pipeline::{
    parse_page, DeleteContext, DeleteHandler, ReadContext, ReadHandler, ReadPage, RecordLocator,
    WriteContext, WriteHandler, WriteMethod,
};
use crate::registry::{EndpointEntry, Support};
use crate::schema::{SchemaProvider, StaticSchemaStore};
use crate::types::{JsonValue, Method, ModuleId};
use crate::urlbuilder::UrlBuilder;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

pub(super) const INFO: ProviderInfo = ProviderInfo {
    name: "aircall",
    display_name: "Aircall",
    base_url: "https://api.aircall.io",
    auth: AuthScheme::Basic,
    token_url: None,
    modules: &[ROOT_MODULE],
    requires_workspace: false,
    required_metadata: &[],
    support: Support::ALL,
    metadata: MetadataSource::Static,
};

pub(super) static CATALOG: CatalogCell =
    LazyLock::new(|| load_catalog(include_str!("../../schemas/aircall.json")));

const DEFAULT_PAGE_SIZE: u32 = 50;

pub(super) fn binding(resolved: &ResolvedParams) -> Result<Box<dyn ProviderBinding>> {
    Ok(Box::new(Aircall {
        base_url: resolved.base_url.clone(),
        store: catalog(&CATALOG)?,
    }))
}

struct Aircall {
    base_url: String,
    store: Arc<StaticSchemaStore>,
}

impl ProviderBinding for Aircall {
    fn endpoints(&self) -> BTreeMap<ModuleId, Vec<EndpointEntry>> {
        BTreeMap::from([(
            ROOT_MODULE.to_string(),
            vec![
                EndpointEntry::new("{calls,users,numbers}", Support::READ),
                EndpointEntry::new("{contacts,tags,teams,webhooks}", Support::ALL),
            ],
        )])
    }

    fn read_handler(&self) -> Option<Arc<dyn ReadHandler>> {
        Some(Arc::new(AircallReader {
            base_url: self.base_url.clone(),
            store: Arc::clone(&self.store),
        }))
    }

    fn write_handler(&self) -> Option<Arc<dyn WriteHandler>> {
        Some(Arc::new(AircallWriter {
            base_url: self.base_url.clone(),
            store: Arc::clone(&self.store),
        }))
    }

    fn delete_handler(&self) -> Option<Arc<dyn DeleteHandler>> {
        Some(Arc::new(AircallDeleter {
            base_url: self.base_url.clone(),
            store: Arc::clone(&self.store),
        }))
    }

    fn schema_provider(&self, _client: &Arc<HttpClient>, module: &str) -> SchemaProvider {
        SchemaProvider::static_schema(Arc::clone(&self.store), module)
    }
}

// ============================================================================
// Read
// ============================================================================

struct AircallReader {
    base_url: String,
    store: Arc<StaticSchemaStore>,
}

impl ReadHandler for AircallReader {
    fn build_request(&self, ctx: &ReadContext<'_>) -> Result<HttpRequest> {
        if let Some(next) = ctx.next_page() {
            return Ok(HttpRequest::get(next));
        }

        let path = self.store.lookup_url_path(ctx.module, ctx.object())?;
        let mut url = UrlBuilder::new(&self.base_url, &[path.as_str()])?;

        if let Some(size) = ctx.page_size {
            let param = self
                .store
                .lookup_page_size_param(ctx.module, ctx.object())
                .unwrap_or("per_page");
            url.with_query_param(param, size.to_string());
        }

        if ctx.provider_side {
            if let Some(since) = ctx.params.since {
                url.with_query_param("from", since.timestamp().to_string());
            }
            if let Some(until) = ctx.params.until {
                url.with_query_param("to", until.timestamp().to_string());
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
        let paginator = self
            .store
            .lookup_pagination_type(ctx.module, ctx.object())
            .paginator();
        parse_page(
            &RecordLocator::key(&[key]),
            paginator.as_ref(),
            ctx,
            request_url,
            response,
        )
    }

    fn time_field(&self, module: &str, object: &str) -> Option<TimeFieldSpec> {
        self.store.is_incremental_read(module, object).then(|| {
            TimeFieldSpec::provider_side()
                .with_timestamp_field("started_at")
                .with_layout(TimestampLayout::UnixSeconds)
        })
    }

    fn default_page_size(&self, _object: &str) -> Option<u32> {
        Some(DEFAULT_PAGE_SIZE)
    }
}

// ============================================================================
// Write / Delete
// ============================================================================

struct AircallWriter {
    base_url: String,
    store: Arc<StaticSchemaStore>,
}

impl WriteHandler for AircallWriter {
    fn build_request(&self, ctx: &WriteContext<'_>) -> Result<HttpRequest> {
        let path = self.store.lookup_url_path(ctx.module, ctx.object)?;
        let body = JsonValue::Object(ctx.object_data()?);

        let request = match ctx.method {
            WriteMethod::Create => {
                HttpRequest::post(UrlBuilder::new(&self.base_url, &[path.as_str()])?.to_string())
            }
            WriteMethod::Update(id) => {
                let url = UrlBuilder::new(&self.base_url, &[path.as_str()])?
                    .add_segment(id)
                    .to_string();
                // contacts are updated with POST, everything else with PUT
                let method = if ctx.object == "contacts" {
                    Method::POST
                } else {
                    Method::PUT
                };
                HttpRequest::new(method, url)
            }
        };
        Ok(request.json(body))
    }
}

struct AircallDeleter {
    base_url: String,
    store: Arc<StaticSchemaStore>,
}

impl DeleteHandler for AircallDeleter {
    fn build_request(&self, ctx: &DeleteContext<'_>) -> Result<HttpRequest> {
        let path = self.store.lookup_url_path(ctx.module, ctx.object)?;
        let mut url = UrlBuilder::new(&self.base_url, &[path.as_str()])?;
        Ok(HttpRequest::delete(url.add_segment(ctx.record_id).to_string()))
    }
}
