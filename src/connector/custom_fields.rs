//! Per-connector memo of provider-defined custom fields

use crate::error::{Error, ErrorKind, Result};
use crate::types::FieldMetadata;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub type CustomFields = BTreeMap<String, FieldMetadata>;

/// Fetches the custom field definitions of an object
#[async_trait]
pub trait CustomFieldSource: Send + Sync {
    /// Objects without custom fields are never fetched
    fn applies_to(&self, object: &str) -> bool;

    async fn fetch(&self, object: &str) -> Result<CustomFields>;
}

/// Fetches each object's custom fields at most once
///
/// The lock is held across the fetch, so concurrent callers for the same
/// object wait for the first one instead of fetching again. Failures are not
/// memoized.
pub struct CustomFieldCache {
    source: Arc<dyn CustomFieldSource>,
    memo: Mutex<HashMap<String, Arc<CustomFields>>>,
}

impl CustomFieldCache {
    pub fn new(source: Arc<dyn CustomFieldSource>) -> Self {
        Self {
            source,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn applies_to(&self, object: &str) -> bool {
        self.source.applies_to(object)
    }

    pub async fn get(&self, object: &str) -> Result<Arc<CustomFields>> {
        let mut memo = self.memo.lock().await;
        if let Some(fields) = memo.get(object) {
            return Ok(Arc::clone(fields));
        }

        let fields = self.source.fetch(object).await.map_err(|e| {
            Error::with_message(ErrorKind::ResolvingCustomFields, format!("{object}: {e}"))
        })?;
        debug!(object, count = fields.len(), "Resolved custom fields");

        let fields = Arc::new(fields);
        memo.insert(object.to_string(), Arc::clone(&fields));
        Ok(fields)
    }
}

impl std::fmt::Debug for CustomFieldCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomFieldCache").finish_non_exhaustive()
    }
}
