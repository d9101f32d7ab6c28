//! Connector built from a provider binding

use super::custom_fields::CustomFieldCache;
use super::types::ProviderInfo;
use super::Connector;
use crate::error::{Error, ErrorKind, Result};
use crate::http::HttpClient;
use crate::pipeline::{Deleter, Reader, Writer};
use crate::registry::{EndpointRegistry, Verb};
use crate::schema::SchemaProvider;
use crate::types::{
    DeleteParams, DeleteResult, ListObjectMetadataResult, ModuleId, ReadParams, ReadResult,
    WriteParams, WriteResult,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Shared by every provider; never branches on provider identity
pub struct GenericConnector {
    pub(super) info: ProviderInfo,
    pub(super) module: ModuleId,
    pub(super) client: Arc<HttpClient>,
    pub(super) registry: Arc<EndpointRegistry>,
    pub(super) schema: SchemaProvider,
    pub(super) custom_fields: Option<CustomFieldCache>,
    pub(super) reader: Option<Reader>,
    pub(super) writer: Option<Writer>,
    pub(super) deleter: Option<Deleter>,
}

impl GenericConnector {
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn client(&self) -> &Arc<HttpClient> {
        &self.client
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    fn unsupported(&self, verb: Verb, object: &str) -> Error {
        Error::with_message(
            ErrorKind::OperationNotSupportedForObject,
            format!("{verb} is not supported for object '{object}' by {}", self.info.name),
        )
    }

    /// Merge memoized custom fields into the objects that have them
    async fn add_custom_fields(
        &self,
        cache: &CustomFieldCache,
        result: &mut ListObjectMetadataResult,
    ) {
        let objects: Vec<String> = result
            .result
            .keys()
            .filter(|object| cache.applies_to(object))
            .cloned()
            .collect();

        for object in objects {
            match cache.get(&object).await {
                Ok(fields) => {
                    if let Some(metadata) = result.result.get_mut(&object) {
                        for (name, field) in fields.iter() {
                            metadata.add_field(name.clone(), field.clone());
                        }
                    }
                }
                Err(e) => {
                    result.result.remove(&object);
                    result.add_error(object, e);
                }
            }
        }
    }
}

impl std::fmt::Debug for GenericConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericConnector")
            .field("provider", &self.info.name)
            .field("module", &self.module)
            .field("client", &self.client)
            .field("schema", &self.schema)
            .field("read", &self.reader.is_some())
            .field("write", &self.writer.is_some())
            .field("delete", &self.deleter.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for GenericConnector {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }

    async fn list_object_metadata(&self, objects: &[String]) -> Result<ListObjectMetadataResult> {
        let mut result = self.schema.object_metadata(objects).await?;
        if let Some(cache) = &self.custom_fields {
            self.add_custom_fields(cache, &mut result).await;
        }
        Ok(result)
    }

    async fn read(&self, params: ReadParams) -> Result<ReadResult> {
        match &self.reader {
            Some(reader) => reader.read(params).await,
            None => Err(self.unsupported(Verb::Read, &params.object_name)),
        }
    }

    async fn write(&self, params: WriteParams) -> Result<WriteResult> {
        match &self.writer {
            Some(writer) => writer.write(params).await,
            None => Err(self.unsupported(Verb::Write, &params.object_name)),
        }
    }

    async fn delete(&self, params: DeleteParams) -> Result<DeleteResult> {
        match &self.deleter {
            Some(deleter) => deleter.delete(params).await,
            None => Err(self.unsupported(Verb::Delete, &params.object_name)),
        }
    }
}
