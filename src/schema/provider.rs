//! Metadata strategies
//!
//! - **EndpointSample**: fetch one record per object and infer its fields
//! - **Static**: answer from the compiled-in catalog, no network
//! - **Composite**: try strategies in order until one does not fail

use super::catalog::StaticSchemaStore;
use super::inference::MetadataInferrer;
use crate::error::{Error, ErrorKind, Result};
use crate::types::{JsonValue, ListObjectMetadataResult, ModuleId, ObjectMetadata};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Source of one sample record per object
#[async_trait]
pub trait ObjectSampler: Send + Sync {
    /// First record of the object's list endpoint, `None` when the list is empty
    async fn sample(&self, object_name: &str) -> Result<Option<JsonValue>>;
}

/// How endpoint sampling visits the requested objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// One task per object
    #[default]
    Parallel,
    /// One object after another
    Serial,
}

/// A strategy answering ListObjectMetadata
#[derive(Clone)]
pub enum SchemaProvider {
    EndpointSample {
        sampler: Arc<dyn ObjectSampler>,
        inferrer: MetadataInferrer,
        mode: FetchMode,
    },
    Static {
        store: Arc<StaticSchemaStore>,
        module: ModuleId,
    },
    Composite(Vec<SchemaProvider>),
}

impl std::fmt::Debug for SchemaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaProvider::EndpointSample { mode, .. } => {
                f.debug_struct("EndpointSample").field("mode", mode).finish()
            }
            SchemaProvider::Static { module, .. } => {
                f.debug_struct("Static").field("module", module).finish()
            }
            SchemaProvider::Composite(strategies) => {
                f.debug_tuple("Composite").field(strategies).finish()
            }
        }
    }
}

impl SchemaProvider {
    pub fn endpoint_sample(sampler: Arc<dyn ObjectSampler>) -> Self {
        SchemaProvider::EndpointSample {
            sampler,
            inferrer: MetadataInferrer::new(),
            mode: FetchMode::Parallel,
        }
    }

    pub fn static_schema(store: Arc<StaticSchemaStore>, module: impl Into<ModuleId>) -> Self {
        SchemaProvider::Static {
            store,
            module: module.into(),
        }
    }

    /// Metadata for `objects`.
    ///
    /// Per-object failures are collected in the result's `errors`; the call
    /// itself fails only when the strategy as a whole cannot answer.
    pub fn object_metadata<'a>(
        &'a self,
        objects: &'a [String],
    ) -> BoxFuture<'a, Result<ListObjectMetadataResult>> {
        Box::pin(async move {
            if objects.is_empty() {
                return Err(ErrorKind::MissingObjects.into());
            }

            match self {
                SchemaProvider::Static { store, module } => store.select(module, objects),
                SchemaProvider::EndpointSample {
                    sampler,
                    inferrer,
                    mode,
                } => Ok(sample_objects(sampler, inferrer, *mode, objects).await),
                SchemaProvider::Composite(strategies) => {
                    let mut last_error = None;
                    for (index, strategy) in strategies.iter().enumerate() {
                        match strategy.object_metadata(objects).await {
                            Ok(result) => return Ok(result),
                            Err(e) => {
                                warn!(strategy = index, error = %e, "Metadata strategy failed, trying next");
                                last_error = Some(e);
                            }
                        }
                    }
                    Err(last_error
                        .unwrap_or_else(|| Error::schema("no metadata strategies configured")))
                }
            }
        })
    }
}

async fn sample_objects(
    sampler: &Arc<dyn ObjectSampler>,
    inferrer: &MetadataInferrer,
    mode: FetchMode,
    objects: &[String],
) -> ListObjectMetadataResult {
    let mut result = ListObjectMetadataResult::new();

    match mode {
        FetchMode::Serial => {
            for object in objects {
                match sample_one(sampler.as_ref(), inferrer, object).await {
                    Ok(metadata) => result.add_result(object.clone(), metadata),
                    Err(e) => result.add_error(object.clone(), e),
                }
            }
        }
        FetchMode::Parallel => {
            let mut tasks = JoinSet::new();
            for object in objects {
                let sampler = Arc::clone(sampler);
                let inferrer = inferrer.clone();
                let object = object.clone();
                tasks.spawn(async move {
                    let outcome = sample_one(sampler.as_ref(), &inferrer, &object).await;
                    (object, outcome)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((object, Ok(metadata))) => result.add_result(object, metadata),
                    Ok((object, Err(e))) => result.add_error(object, e),
                    Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                    Err(e) => warn!(error = %e, "Metadata task cancelled"),
                }
            }
        }
    }

    result
}

async fn sample_one(
    sampler: &dyn ObjectSampler,
    inferrer: &MetadataInferrer,
    object: &str,
) -> Result<ObjectMetadata> {
    debug!(object = %object, "Sampling object");
    match sampler.sample(object).await? {
        Some(record) => Ok(inferrer.infer(object, &record)),
        None => Err(Error::with_message(
            ErrorKind::MissingExpectedValues,
            format!("no records to sample for '{object}'"),
        )),
    }
}
