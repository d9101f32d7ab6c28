//! Write pipeline

use super::handlers::{WriteContext, WriteHandler, WriteMethod};
use crate::error::Result;
use crate::http::HttpClient;
use crate::registry::{EndpointRegistry, Verb};
use crate::types::{ModuleId, WriteParams, WriteResult};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct Writer {
    client: Arc<HttpClient>,
    registry: Arc<EndpointRegistry>,
    handler: Arc<dyn WriteHandler>,
    module: ModuleId,
}

impl Writer {
    pub fn new(
        client: Arc<HttpClient>,
        registry: Arc<EndpointRegistry>,
        handler: Arc<dyn WriteHandler>,
        module: impl Into<ModuleId>,
    ) -> Self {
        Self {
            client,
            registry,
            handler,
            module: module.into(),
        }
    }

    /// Create when `record_id` is unset, update otherwise
    pub async fn write(&self, params: WriteParams) -> Result<WriteResult> {
        params.validate()?;
        self.registry
            .validate(&self.module, &params.object_name, Verb::Write)?;

        let method = match params.record_id.as_deref() {
            Some(id) => WriteMethod::Update(id),
            None => WriteMethod::Create,
        };
        let ctx = WriteContext {
            module: &self.module,
            object: &params.object_name,
            method,
            data: &params.record_data,
        };

        let request = self.handler.build_request(&ctx)?;
        debug!(object = %params.object_name, method = ?request.method, update = ctx.is_update(), "Writing record");
        let response = self.client.send(request).await?;
        self.handler.parse_response(&ctx, &response)
    }
}
