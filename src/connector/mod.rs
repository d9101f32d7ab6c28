//! Connector trait and assembly
//!
//! A connector exposes the four verbs over one provider module. Providers
//! describe themselves with a [`ProviderInfo`] and plug their request
//! builders and parsers in through a [`ProviderBinding`];
//! [`ConnectorBuilder`] wires both into a [`GenericConnector`].

mod binding;
mod builder;
mod custom_fields;
mod generic;
mod types;

pub use binding::ProviderBinding;
pub use builder::ConnectorBuilder;
pub use custom_fields::{CustomFieldCache, CustomFieldSource, CustomFields};
pub use generic::GenericConnector;
pub use types::{
    AuthScheme, ConnectorParams, HttpSettings, MetadataSource, ProviderInfo, ResolvedParams,
    ROOT_MODULE,
};

use crate::error::Result;
use crate::types::{
    DeleteParams, DeleteResult, ListObjectMetadataResult, ReadParams, ReadResult, WriteParams,
    WriteResult,
};
use async_trait::async_trait;

/// The four uniform verbs
///
/// Connectors are `Send + Sync` and meant to be shared behind an `Arc`.
/// Dropping a returned future cancels the in-flight request.
#[async_trait]
pub trait Connector: Send + Sync {
    fn info(&self) -> &ProviderInfo;

    /// Per-object failures land in the result's `errors` map
    async fn list_object_metadata(&self, objects: &[String]) -> Result<ListObjectMetadataResult>;

    async fn read(&self, params: ReadParams) -> Result<ReadResult>;

    async fn write(&self, params: WriteParams) -> Result<WriteResult>;

    async fn delete(&self, params: DeleteParams) -> Result<DeleteResult>;
}
