//! JSON navigation module
//!
//! Provider responses are heterogeneous. `JsonQuery` walks a parsed body by
//! key path with typed accessors: `*_required` accessors fail when the key is
//! missing, `*_optional` accessors return `None` for a missing key but still
//! fail when the key holds a value of the wrong type.
//!
//! `select` evaluates full JSONPath expressions (wildcards, filters) for the
//! rare bodies that need them, and `convert` turns nodes into native maps.

pub mod convert;
mod query;

pub use query::{extract_text, select, JsonQuery};
