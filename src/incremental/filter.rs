//! Provider-side vs connector-side time filtering

use super::types::{FilterType, TimeFieldSpec, TimestampLayout};
use crate::error::Result;
use crate::jsonquery::extract_text;
use crate::types::{JsonValue, ReadParams};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Records kept by a filter, and whether pagination may stop
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterOutcome {
    pub records: Vec<JsonValue>,
    /// A record at or past `until` was seen in a chronological listing
    pub exhausted: bool,
}

/// Local filter applied to each fetched page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReadFilter {
    #[default]
    Identity,
    /// Keep `since <= ts < until`
    Window {
        field: String,
        layout: TimestampLayout,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        chronological: bool,
    },
}

impl ReadFilter {
    pub fn apply(&self, records: Vec<JsonValue>) -> Result<FilterOutcome> {
        let ReadFilter::Window {
            field,
            layout,
            since,
            until,
            chronological,
        } = self
        else {
            return Ok(FilterOutcome {
                records,
                exhausted: false,
            });
        };

        let total = records.len();
        let mut kept = Vec::with_capacity(total);
        let mut exhausted = false;

        for record in records {
            let Some(raw) = extract_text(&record, field) else {
                continue;
            };
            let ts = layout.parse(field, &raw)?;

            if until.is_some_and(|until| ts >= until) {
                if *chronological {
                    exhausted = true;
                    break;
                }
                continue;
            }
            if since.is_some_and(|since| ts < since) {
                continue;
            }
            kept.push(record);
        }

        debug!(field = %field, total, kept = kept.len(), exhausted, "Applied time window");
        Ok(FilterOutcome {
            records: kept,
            exhausted,
        })
    }
}

/// Decision for one read: query parameters upstream, local window, or neither
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IncrementalPlan {
    /// The request builder adds the provider's time parameters
    pub provider_side: bool,
    pub filter: ReadFilter,
}

impl IncrementalPlan {
    pub fn new(spec: Option<&TimeFieldSpec>, params: &ReadParams) -> Self {
        let Some(spec) = spec else {
            return Self::default();
        };
        if !params.has_time_window() {
            return Self::default();
        }

        if spec.filter_type == FilterType::ProviderSide {
            return Self {
                provider_side: true,
                filter: ReadFilter::Identity,
            };
        }

        Self {
            provider_side: false,
            filter: window(spec, params),
        }
    }

    /// Plan after the provider rejected its own time filter
    pub fn without_provider_side(spec: Option<&TimeFieldSpec>, params: &ReadParams) -> Self {
        let plan = Self::connector_side(spec, params);
        warn!(
            object = %params.object_name,
            local = plan.filter != ReadFilter::Identity,
            "Provider rejected time filter, dropping it"
        );
        plan
    }

    /// Local window on the object's timestamp field, whatever its filter type
    pub fn connector_side(spec: Option<&TimeFieldSpec>, params: &ReadParams) -> Self {
        Self {
            provider_side: false,
            filter: spec.map_or(ReadFilter::Identity, |spec| window(spec, params)),
        }
    }
}

fn window(spec: &TimeFieldSpec, params: &ReadParams) -> ReadFilter {
    match &spec.timestamp_field {
        Some(field) if params.has_time_window() => ReadFilter::Window {
            field: field.clone(),
            layout: spec.layout.clone(),
            since: params.since,
            until: params.until,
            chronological: spec.chronological,
        },
        _ => ReadFilter::Identity,
    }
}
