//! Schema subsystem
//!
//! Object metadata comes from one of two places:
//!
//! - **Static catalogs**: JSON generated from a provider's OpenAPI document,
//!   embedded in the binary and served without network calls
//! - **Endpoint sampling**: one live record per object, field types inferred
//!   from the JSON values
//!
//! `SchemaProvider` chooses between them and can fall through a list.

mod catalog;
mod inference;
pub mod openapi;
mod provider;
mod types;

pub use catalog::StaticSchemaStore;
pub use inference::{display_name, MetadataInferrer};
pub use openapi::OpenApiExtractor;
pub use provider::{FetchMode, ObjectSampler, SchemaProvider};
pub use types::{FieldSet, ModuleSchema, ObjectSchema, SchemaCatalog};

#[cfg(test)]
mod tests;
