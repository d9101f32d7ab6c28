//! Read pipeline

use super::handlers::{ReadContext, ReadHandler};
use super::marshal::marshal;
use crate::error::{ErrorKind, Result};
use crate::http::HttpClient;
use crate::incremental::IncrementalPlan;
use crate::registry::{EndpointRegistry, Verb};
use crate::schema::ObjectSampler;
use crate::types::{FieldSelection, JsonValue, ModuleId, ReadParams, ReadResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Validate → plan → request → parse → filter → marshal
#[derive(Clone)]
pub struct Reader {
    client: Arc<HttpClient>,
    registry: Arc<EndpointRegistry>,
    handler: Arc<dyn ReadHandler>,
    module: ModuleId,
}

impl Reader {
    pub fn new(
        client: Arc<HttpClient>,
        registry: Arc<EndpointRegistry>,
        handler: Arc<dyn ReadHandler>,
        module: impl Into<ModuleId>,
    ) -> Self {
        Self {
            client,
            registry,
            handler,
            module: module.into(),
        }
    }

    pub async fn read(&self, params: ReadParams) -> Result<ReadResult> {
        params.validate()?;
        self.registry
            .validate(&self.module, &params.object_name, Verb::Read)?;

        let spec = self.handler.time_field(&self.module, &params.object_name);
        let mut plan = IncrementalPlan::new(spec.as_ref(), &params);
        let page_size = params
            .page_size
            .or_else(|| self.handler.default_page_size(&params.object_name));

        if plan.provider_side {
            match params.next_page.as_deref() {
                // the first page fell back to local filtering
                Some(next) if !self.handler.cursor_keeps_time_filter(next) => {
                    debug!(object = %params.object_name, "Cursor carries no time filter");
                    plan = IncrementalPlan::connector_side(spec.as_ref(), &params);
                }
                Some(_) => {}
                None => {
                    let ctx = self.context(&params, true, page_size);
                    if let Some(probe) = self.handler.probe_request(&ctx)? {
                        match self.client.send(probe).await {
                            Ok(_) => debug!(object = %params.object_name, "Time filter accepted"),
                            Err(e) if e.is(ErrorKind::BadRequest) || e.is(ErrorKind::Caller) => {
                                plan = IncrementalPlan::without_provider_side(spec.as_ref(), &params);
                            }
                            Err(e) => return Err(e),
                        }
                    }
                }
            }
        }

        let ctx = self.context(&params, plan.provider_side, page_size);
        let request = self.handler.build_request(&ctx)?;
        let url = self.client.resolve_url(&request.url);
        let response = self.client.send(request).await?;
        let page = self.handler.parse_response(&ctx, &url, &response)?;

        let outcome = plan.filter.apply(page.records)?;
        let next_page = if outcome.exhausted {
            None
        } else {
            page.next_page
        };

        let data = marshal(&outcome.records, &params.fields)?;
        debug!(object = %params.object_name, rows = data.len(), more = next_page.is_some(), "Read page");
        Ok(ReadResult::new(data, next_page))
    }

    fn context<'a>(
        &'a self,
        params: &'a ReadParams,
        provider_side: bool,
        page_size: Option<u32>,
    ) -> ReadContext<'a> {
        ReadContext {
            module: &self.module,
            params,
            provider_side,
            page_size,
        }
    }
}

/// Samples one record through a read handler, for endpoint-sampled metadata
#[derive(Clone)]
pub struct ReadSampler {
    client: Arc<HttpClient>,
    handler: Arc<dyn ReadHandler>,
    module: ModuleId,
}

impl ReadSampler {
    pub fn new(client: Arc<HttpClient>, handler: Arc<dyn ReadHandler>, module: impl Into<ModuleId>) -> Self {
        Self {
            client,
            handler,
            module: module.into(),
        }
    }
}

#[async_trait]
impl ObjectSampler for ReadSampler {
    async fn sample(&self, object_name: &str) -> Result<Option<JsonValue>> {
        let params = ReadParams::new(object_name, FieldSelection::All).page_size(1);
        let ctx = ReadContext {
            module: &self.module,
            params: &params,
            provider_side: false,
            page_size: Some(1),
        };

        let request = self.handler.build_request(&ctx)?;
        let url = self.client.resolve_url(&request.url);
        let response = self.client.send(request).await?;
        let page = self.handler.parse_response(&ctx, &url, &response)?;
        Ok(page.records.into_iter().next())
    }
}
