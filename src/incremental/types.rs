//! Incremental read configuration types

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Where a time window is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// The provider narrows the listing through query parameters
    ProviderSide,
    /// Records are fetched in full and filtered locally
    #[default]
    ConnectorSide,
}

/// Encoding of a timestamp, both in records and in provider query parameters
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimestampLayout {
    #[default]
    Rfc3339,
    UnixSeconds,
    UnixMillis,
    /// chrono format string, e.g. `%Y-%m-%d %H:%M:%S`
    Custom(String),
}

impl TimestampLayout {
    /// Render a point in time for a query parameter
    pub fn format(&self, ts: DateTime<Utc>) -> String {
        match self {
            TimestampLayout::Rfc3339 => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimestampLayout::UnixSeconds => ts.timestamp().to_string(),
            TimestampLayout::UnixMillis => ts.timestamp_millis().to_string(),
            TimestampLayout::Custom(fmt) => ts.format(fmt).to_string(),
        }
    }

    /// Parse a record value; `field` names it in errors
    pub fn parse(&self, field: &str, raw: &str) -> Result<DateTime<Utc>> {
        let invalid = || Error::InvalidTimestamp {
            field: field.to_string(),
            value: raw.to_string(),
        };

        match self {
            TimestampLayout::Rfc3339 => DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|_| invalid()),
            TimestampLayout::UnixSeconds => raw
                .parse::<f64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs.trunc() as i64, 0))
                .ok_or_else(invalid),
            TimestampLayout::UnixMillis => raw
                .parse::<f64>()
                .ok()
                .and_then(|ms| DateTime::from_timestamp_millis(ms.trunc() as i64))
                .ok_or_else(invalid),
            TimestampLayout::Custom(fmt) => DateTime::parse_from_str(raw, fmt)
                .map(|ts| ts.with_timezone(&Utc))
                .or_else(|_| NaiveDateTime::parse_from_str(raw, fmt).map(|ts| ts.and_utc()))
                .or_else(|_| {
                    NaiveDate::parse_from_str(raw, fmt)
                        .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
                })
                .map_err(|_| invalid()),
        }
    }
}

/// How one object participates in incremental reads
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeFieldSpec {
    pub filter_type: FilterType,
    /// Dotted path of the record timestamp, when records carry one
    pub timestamp_field: Option<String>,
    pub layout: TimestampLayout,
    /// Records arrive ordered by the timestamp field, oldest first
    pub chronological: bool,
}

impl TimeFieldSpec {
    /// Provider filters by time; records are not inspected
    pub fn provider_side() -> Self {
        Self {
            filter_type: FilterType::ProviderSide,
            ..Default::default()
        }
    }

    /// Records are filtered locally by `field`
    pub fn connector_side(field: impl Into<String>) -> Self {
        Self {
            filter_type: FilterType::ConnectorSide,
            timestamp_field: Some(field.into()),
            ..Default::default()
        }
    }

    /// Timestamp to fall back on when the provider-side filter is rejected
    #[must_use]
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: TimestampLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn chronological(mut self) -> Self {
        self.chronological = true;
        self
    }
}
