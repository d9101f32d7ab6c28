//! HTTP status to error kind mapping

use crate::error::ErrorKind;
use std::collections::HashMap;

/// Default classification with per-provider overrides
#[derive(Debug, Clone, Default)]
pub struct StatusMap {
    overrides: HashMap<u16, ErrorKind>,
}

impl StatusMap {
    #[must_use]
    pub fn with_override(mut self, status: u16, kind: ErrorKind) -> Self {
        self.overrides.insert(status, kind);
        self
    }

    pub fn kind_for(&self, status: u16) -> ErrorKind {
        if let Some(kind) = self.overrides.get(&status) {
            return *kind;
        }

        match status {
            400 => ErrorKind::Caller,
            401 => ErrorKind::AccessToken,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            429 => ErrorKind::Retryable,
            402..=499 => ErrorKind::Caller,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::RequestFailed,
        }
    }
}
