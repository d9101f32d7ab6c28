//! LinkedIn Marketing: Rest.li 2.0 with versioned headers and page tokens

use crate::connector::{
    AuthScheme, MetadataSource, ProviderBinding, ProviderInfo, ResolvedParams, ROOT_MODULE,
};
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::pagination::{NoPaginator, Paginator, TokenPaginator};
use crate::pipeline::{
    parse_page, DeleteContext, DeleteHandler, ReadContext, ReadHandler, ReadPage, RecordLocator,
    WriteContext, WriteHandler, WriteMethod,
};
use crate::registry::{EndpointEntry, Support};
use crate::types::{JsonValue, ModuleId};
use crate::urlbuilder::UrlBuilder;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

pub(super) const INFO: ProviderInfo = ProviderInfo {
    name: "linkedin",
    display_name: "LinkedIn",
    base_url: "https://api.linkedin.com/rest",
    auth: AuthScheme::Oauth2,
    token_url: Some("https://www.linkedin.com/oauth/v2/accessToken"),
    modules: &[ROOT_MODULE],
    requires_workspace: false,
    required_metadata: &[],
    support: Support::ALL,
    metadata: MetadataSource::EndpointSample,
};

const API_VERSION: &str = "202504";
const PROTOCOL_VERSION: &str = "2.0.0";
const DEFAULT_PAGE_SIZE: u32 = 100;

pub(super) fn binding(resolved: &ResolvedParams) -> Result<Box<dyn ProviderBinding>> {
    UrlBuilder::new(&resolved.base_url, &[])?;
    Ok(Box::new(Linkedin {
        handler: Arc::new(RestliHandler {
            base_url: resolved.base_url.clone(),
        }),
    }))
}

struct Linkedin {
    handler: Arc<RestliHandler>,
}

impl ProviderBinding for Linkedin {
    fn endpoints(&self) -> BTreeMap<ModuleId, Vec<EndpointEntry>> {
        BTreeMap::from([(
            ROOT_MODULE.to_string(),
            vec![
                EndpointEntry::new("adAccounts", Support::ALL),
                EndpointEntry::new("adTargetingFacets", Support::READ),
            ],
        )])
    }

    fn default_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LinkedIn-Version", API_VERSION.to_string()),
            ("X-Restli-Protocol-Version", PROTOCOL_VERSION.to_string()),
        ]
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

struct RestliHandler {
    base_url: String,
}

impl RestliHandler {
    fn url(&self, object: &str, record_id: Option<&str>) -> Result<String> {
        let mut url = UrlBuilder::new(&self.base_url, &[object])?;
        if let Some(id) = record_id {
            url.add_segment(id);
        }
        Ok(url.to_string())
    }

    /// Finder-based collections page with tokens; the rest answer in one page
    fn searchable(object: &str) -> bool {
        object == "adAccounts"
    }
}

impl ReadHandler for RestliHandler {
    fn build_request(&self, ctx: &ReadContext<'_>) -> Result<HttpRequest> {
        if let Some(next) = ctx.next_page() {
            return Ok(HttpRequest::get(next));
        }

        let mut url = UrlBuilder::new(&self.base_url, &[ctx.object()])?;
        if Self::searchable(ctx.object()) {
            url.with_query_param("q", "search");
            if let Some(size) = ctx.page_size {
                url.with_query_param("pageSize", size.to_string());
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
        let tokens = TokenPaginator::new(&["metadata", "nextPageToken"], "pageToken");
        let paginator: &dyn Paginator = if Self::searchable(ctx.object()) {
            &tokens
        } else {
            &NoPaginator
        };
        parse_page(
            &RecordLocator::key(&["elements"]),
            paginator,
            ctx,
            request_url,
            response,
        )
    }

    fn default_page_size(&self, object: &str) -> Option<u32> {
        Self::searchable(object).then_some(DEFAULT_PAGE_SIZE)
    }
}

impl WriteHandler for RestliHandler {
    /// Creates answer 201 with the id in `x-restli-id`; partial updates answer 204
    fn build_request(&self, ctx: &WriteContext<'_>) -> Result<HttpRequest> {
        let data = JsonValue::Object(ctx.object_data()?);
        Ok(match ctx.method {
            WriteMethod::Create => HttpRequest::post(self.url(ctx.object, None)?).json(data),
            WriteMethod::Update(id) => HttpRequest::post(self.url(ctx.object, Some(id))?)
                .header("X-RestLi-Method", "PARTIAL_UPDATE")
                .json(json!({ "patch": { "$set": data } })),
        })
    }
}

impl DeleteHandler for RestliHandler {
    fn build_request(&self, ctx: &DeleteContext<'_>) -> Result<HttpRequest> {
        Ok(HttpRequest::delete(self.url(ctx.object, Some(ctx.record_id))?))
    }
}
