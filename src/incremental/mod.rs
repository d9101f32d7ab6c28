//! Incremental read engine
//!
//! Each object may declare a `TimeFieldSpec`. For a read with `since` or
//! `until` set:
//!
//! - **Provider-side**: the request builder adds the provider's time query
//!   parameters and records pass through unchanged
//! - **Connector-side**: records are dropped locally unless their timestamp
//!   falls in `[since, until)`
//! - **No timestamp**: the window is ignored
//!
//! A provider-side filter rejected by the provider (probe answered with a
//! client error) degrades to the connector-side window when the object
//! names a timestamp field.

mod filter;
mod types;

pub use filter::{FilterOutcome, IncrementalPlan, ReadFilter};
pub use types::{FilterType, TimeFieldSpec, TimestampLayout};
