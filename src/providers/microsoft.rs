//! Microsoft Graph: OData listings with `@odata.nextLink` cursors and a
//! probed `$filter` on `lastModifiedDateTime`

use crate::connector::{
    AuthScheme, MetadataSource, ProviderBinding, ProviderInfo, ResolvedParams, ROOT_MODULE,
};
use crate::error::{ErrorKind, Result};
use crate::http::{ErrorHandler, HttpRequest, HttpResponse};
use crate::incremental::{TimeFieldSpec, TimestampLayout};
use crate::interpreter::ErrorInterpreter;
use crate::pagination::NextUrlPaginator;
use crate::pipeline::{
    parse_page, DeleteContext, DeleteHandler, ReadContext, ReadHandler, ReadPage, RecordLocator,
    WriteContext, WriteHandler, WriteMethod,
};
use crate::registry::{EndpointEntry, Support};
use crate::types::{JsonValue, Method, ModuleId, ReadParams};
use crate::urlbuilder::{UrlBuilder, QUERY_ENCODING_EXCEPTIONS};
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

pub(super) const INFO: ProviderInfo = ProviderInfo {
    name: "microsoft",
    display_name: "Microsoft Graph",
    base_url: "https://graph.microsoft.com/v1.0",
    auth: AuthScheme::Oauth2,
    token_url: Some("https://login.microsoftonline.com/common/oauth2/v2.0/token"),
    modules: &[ROOT_MODULE],
    requires_workspace: false,
    required_metadata: &[],
    support: Support::ALL,
    metadata: MetadataSource::EndpointSample,
};

const DEFAULT_PAGE_SIZE: u32 = 100;
const LAST_MODIFIED: &str = "lastModifiedDateTime";

pub(super) fn binding(resolved: &ResolvedParams) -> Result<Box<dyn ProviderBinding>> {
    // validated once so request builders can assume a well-formed base
    UrlBuilder::new(&resolved.base_url, &[])?;
    Ok(Box::new(Microsoft {
        handler: Arc::new(GraphHandler {
            base_url: resolved.base_url.clone(),
        }),
    }))
}

struct Microsoft {
    handler: Arc<GraphHandler>,
}

impl ProviderBinding for Microsoft {
    fn endpoints(&self) -> BTreeMap<ModuleId, Vec<EndpointEntry>> {
        BTreeMap::from([(
            ROOT_MODULE.to_string(),
            vec![
                EndpointEntry::new("{users,groups}", Support::ALL),
                EndpointEntry::new("me/{contacts,events}", Support::ALL),
                EndpointEntry::new("me/messages", Support::READ.with_delete()),
            ],
        )])
    }

    fn error_handler(&self) -> Arc<dyn ErrorHandler> {
        Arc::new(ErrorInterpreter::default().with_status_override(400, ErrorKind::BadRequest))
    }

    fn read_handler(&self) -> Option<Arc<dyn ReadHandler>> {
        Some(Arc::clone(&self.handler) as Arc<dyn ReadHandler>)
    }

    fn write_handler(&self) -> Option<Arc<dyn WriteHandler>> {
        Some(Arc::clone(&self.handler) as Arc<dyn WriteHandler>)
    }

    fn delete_handler(&self) -> Option<Arc<dyn DeleteHandler>> {
        Some(Arc::clone(&self.handler) as Arc<dyn DeleteHandler>)
    }
}

pub(super) struct GraphHandler {
    pub(super) base_url: String,
}

/// `lastModifiedDateTime ge <since> and lastModifiedDateTime lt <until>`
fn time_filter(params: &ReadParams) -> Option<String> {
    let layout = TimestampLayout::Rfc3339;
    let mut clauses = Vec::new();
    if let Some(since) = params.since {
        clauses.push(format!("{LAST_MODIFIED} ge {}", layout.format(since)));
    }
    if let Some(until) = params.until {
        clauses.push(format!("{LAST_MODIFIED} lt {}", layout.format(until)));
    }
    (!clauses.is_empty()).then(|| clauses.join(" and "))
}

impl GraphHandler {
    fn list_url(&self, ctx: &ReadContext<'_>) -> Result<UrlBuilder> {
        let mut url = UrlBuilder::new(&self.base_url, &[ctx.object()])?;
        url.add_encoding_exceptions(&QUERY_ENCODING_EXCEPTIONS);
        if ctx.provider_side {
            if let Some(filter) = time_filter(ctx.params) {
                url.with_query_param("$filter", filter);
            }
        }
        Ok(url)
    }

    fn record_url(&self, object: &str, id: &str) -> Result<String> {
        Ok(UrlBuilder::new(&self.base_url, &[object])?
            .add_segment(id)
            .to_string())
    }
}

impl ReadHandler for GraphHandler {
    fn build_request(&self, ctx: &ReadContext<'_>) -> Result<HttpRequest> {
        let url = match ctx.next_page() {
            Some(next) => next.to_string(),
            None => self.list_url(ctx)?.to_string(),
        };
        let mut request = HttpRequest::get(url);
        if let Some(size) = ctx.page_size {
            request = request.header("Prefer", format!("odata.maxpagesize={size}"));
        }
        Ok(request)
    }

    fn parse_response(
        &self,
        ctx: &ReadContext<'_>,
        request_url: &str,
        response: &HttpResponse,
    ) -> Result<ReadPage> {
        parse_page(
            &RecordLocator::key(&["value"]),
            &NextUrlPaginator::new(&[&["@odata.nextLink"]]),
            ctx,
            request_url,
            response,
        )
    }

    fn time_field(&self, _module: &str, object: &str) -> Option<TimeFieldSpec> {
        object
            .starts_with("me/")
            .then(|| TimeFieldSpec::provider_side().with_timestamp_field(LAST_MODIFIED))
    }

    fn default_page_size(&self, _object: &str) -> Option<u32> {
        Some(DEFAULT_PAGE_SIZE)
    }

    /// Not every collection supports filtering on `lastModifiedDateTime`
    fn probe_request(&self, ctx: &ReadContext<'_>) -> Result<Option<HttpRequest>> {
        let url = self.list_url(ctx)?;
        Ok(Some(
            HttpRequest::get(url.to_string()).header("Prefer", "odata.maxpagesize=1"),
        ))
    }

    /// Graph copies an accepted `$filter` into `@odata.nextLink`
    fn cursor_keeps_time_filter(&self, next_page: &str) -> bool {
        Url::parse(next_page).is_ok_and(|url| url.query_pairs().any(|(key, _)| key == "$filter"))
    }
}

impl WriteHandler for GraphHandler {
    fn build_request(&self, ctx: &WriteContext<'_>) -> Result<HttpRequest> {
        let body = JsonValue::Object(ctx.object_data()?);
        let request = match ctx.method {
            WriteMethod::Create => {
                HttpRequest::post(UrlBuilder::new(&self.base_url, &[ctx.object])?.to_string())
            }
            WriteMethod::Update(id) => {
                HttpRequest::new(Method::PATCH, self.record_url(ctx.object, id)?)
            }
        };
        Ok(request.json(body))
    }
}

impl DeleteHandler for GraphHandler {
    fn build_request(&self, ctx: &DeleteContext<'_>) -> Result<HttpRequest> {
        Ok(HttpRequest::delete(self.record_url(ctx.object, ctx.record_id)?))
    }
}
