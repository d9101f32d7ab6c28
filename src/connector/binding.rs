//! What a provider contributes to a connector

use super::custom_fields::CustomFieldSource;
use crate::http::{ErrorHandler, HttpClient};
use crate::interpreter::ErrorInterpreter;
use crate::pipeline::{DeleteHandler, ReadHandler, ReadSampler, WriteHandler};
use crate::registry::EndpointEntry;
use crate::schema::SchemaProvider;
use crate::types::ModuleId;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Provider-specific parts plugged into the generic pipelines
///
/// Only the endpoint table and a read handler are mandatory. A provider
/// without a write or delete handler rejects those verbs for every object.
pub trait ProviderBinding: Send + Sync {
    /// Endpoint patterns per module
    fn endpoints(&self) -> BTreeMap<ModuleId, Vec<EndpointEntry>>;

    fn error_handler(&self) -> Arc<dyn ErrorHandler> {
        Arc::new(ErrorInterpreter::default())
    }

    /// Headers sent with every request
    fn default_headers(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn read_handler(&self) -> Option<Arc<dyn ReadHandler>>;

    fn write_handler(&self) -> Option<Arc<dyn WriteHandler>> {
        None
    }

    fn delete_handler(&self) -> Option<Arc<dyn DeleteHandler>> {
        None
    }

    /// Metadata strategy; samples the read handler by default
    fn schema_provider(&self, client: &Arc<HttpClient>, module: &str) -> SchemaProvider {
        match self.read_handler() {
            Some(handler) => SchemaProvider::endpoint_sample(Arc::new(ReadSampler::new(
                Arc::clone(client),
                handler,
                module,
            ))),
            None => SchemaProvider::Composite(Vec::new()),
        }
    }

    fn custom_fields(&self, _client: &Arc<HttpClient>) -> Option<Arc<dyn CustomFieldSource>> {
        None
    }
}
