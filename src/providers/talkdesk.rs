//! Talkdesk: HAL listings (`_embedded`, `_links.next.href`) behind a
//! per-account token endpoint

use crate::connector::{
    AuthScheme, MetadataSource, ProviderBinding, ProviderInfo, ResolvedParams, ROOT_MODULE,
};
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::pagination::NextUrlPaginator;
use crate::pipeline::{parse_page, ReadContext, ReadHandler, ReadPage, RecordLocator};
use crate::registry::{EndpointEntry, Support};
use crate::types::ModuleId;
use crate::urlbuilder::UrlBuilder;
use std::collections::BTreeMap;
use std::sync::Arc;

pub(super) const INFO: ProviderInfo = ProviderInfo {
    name: "talkdesk",
    display_name: "Talkdesk",
    base_url: "https://api.talkdeskapp.com",
    auth: AuthScheme::Oauth2,
    token_url: Some("https://{{ workspace }}.talkdeskid.com/oauth/token"),
    modules: &[ROOT_MODULE],
    requires_workspace: true,
    required_metadata: &[],
    support: Support::READ,
    metadata: MetadataSource::EndpointSample,
};

const DEFAULT_PAGE_SIZE: u32 = 50;

pub(super) fn binding(resolved: &ResolvedParams) -> Result<Box<dyn ProviderBinding>> {
    UrlBuilder::new(&resolved.base_url, &[])?;
    Ok(Box::new(Talkdesk {
        base_url: resolved.base_url.clone(),
    }))
}

struct Talkdesk {
    base_url: String,
}

impl ProviderBinding for Talkdesk {
    fn endpoints(&self) -> BTreeMap<ModuleId, Vec<EndpointEntry>> {
        BTreeMap::from([(
            ROOT_MODULE.to_string(),
            vec![EndpointEntry::new("{users,ring-groups}", Support::READ)],
        )])
    }

    fn read_handler(&self) -> Option<Arc<dyn ReadHandler>> {
        Some(Arc::new(HalReader {
            base_url: self.base_url.clone(),
        }))
    }
}

struct HalReader {
    base_url: String,
}

impl ReadHandler for HalReader {
    fn build_request(&self, ctx: &ReadContext<'_>) -> Result<HttpRequest> {
        if let Some(next) = ctx.next_page() {
            return Ok(HttpRequest::get(next));
        }

        let mut url = UrlBuilder::new(&self.base_url, &[ctx.object()])?;
        url.with_query_param("page", "1");
        if let Some(size) = ctx.page_size {
            url.with_query_param("per_page", size.to_string());
        }
        Ok(HttpRequest::get(url.to_string()))
    }

    /// Embedded collections use snake case: `ring-groups` lives under `_embedded.ring_groups`
    fn parse_response(
        &self,
        ctx: &ReadContext<'_>,
        request_url: &str,
        response: &HttpResponse,
    ) -> Result<ReadPage> {
        let embedded = ctx.object().replace('-', "_");
        parse_page(
            &RecordLocator::key(&["_embedded", embedded.as_str()]),
            &NextUrlPaginator::new(&[&["_links", "next", "href"]]),
            ctx,
            request_url,
            response,
        )
    }

    fn default_page_size(&self, _object: &str) -> Option<u32> {
        Some(DEFAULT_PAGE_SIZE)
    }
}
