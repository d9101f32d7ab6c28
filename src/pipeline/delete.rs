//! Delete pipeline

use super::handlers::{DeleteContext, DeleteHandler};
use crate::error::Result;
use crate::http::HttpClient;
use crate::registry::{EndpointRegistry, Verb};
use crate::types::{DeleteParams, DeleteResult, ModuleId};
use std::sync::Arc;

#[derive(Clone)]
pub struct Deleter {
    client: Arc<HttpClient>,
    registry: Arc<EndpointRegistry>,
    handler: Arc<dyn DeleteHandler>,
    module: ModuleId,
}

impl Deleter {
    pub fn new(
        client: Arc<HttpClient>,
        registry: Arc<EndpointRegistry>,
        handler: Arc<dyn DeleteHandler>,
        module: impl Into<ModuleId>,
    ) -> Self {
        Self {
            client,
            registry,
            handler,
            module: module.into(),
        }
    }

    pub async fn delete(&self, params: DeleteParams) -> Result<DeleteResult> {
        params.validate()?;
        self.registry
            .validate(&self.module, &params.object_name, Verb::Delete)?;

        let ctx = DeleteContext {
            module: &self.module,
            object: &params.object_name,
            record_id: &params.record_id,
        };
        let request = self.handler.build_request(&ctx)?;
        let response = self.client.send(request).await?;
        self.handler.parse_response(&ctx, &response)
    }
}
