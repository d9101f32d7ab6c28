//! Built-in provider bindings
//!
//! The provider set is closed: each variant of [`Provider`] contributes a
//! [`ProviderInfo`], a [`ProviderBinding`] and, for some, a static schema
//! catalog embedded in the binary.
//!
//! | Provider | Auth | Pagination | Metadata |
//! |---|---|---|---|
//! | aircall | basic | `meta.next_page_link` | static |
//! | braintree | basic | Relay (GraphQL) | sampled |
//! | expensify | body credentials | none | sampled |
//! | groove | dual header | page number | static + custom fields |
//! | linkedin | oauth2 | `metadata.nextPageToken` | sampled |
//! | microsoft | oauth2 | `@odata.nextLink` | sampled |
//! | talkdesk | oauth2 (workspace token URL) | HAL `_links.next.href` | sampled |

mod aircall;
mod braintree;
mod expensify;
mod groove;
mod linkedin;
mod microsoft;
mod talkdesk;

use crate::connector::{
    ConnectorBuilder, ConnectorParams, GenericConnector, ProviderBinding, ProviderInfo,
    ResolvedParams,
};
use crate::error::{Error, Result};
use crate::schema::StaticSchemaStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

/// Every supported provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aircall,
    Braintree,
    Expensify,
    Groove,
    Linkedin,
    Microsoft,
    Talkdesk,
}

impl Provider {
    pub const ALL: [Provider; 7] = [
        Provider::Aircall,
        Provider::Braintree,
        Provider::Expensify,
        Provider::Groove,
        Provider::Linkedin,
        Provider::Microsoft,
        Provider::Talkdesk,
    ];

    pub fn info(self) -> ProviderInfo {
        match self {
            Provider::Aircall => aircall::INFO,
            Provider::Braintree => braintree::INFO,
            Provider::Expensify => expensify::INFO,
            Provider::Groove => groove::INFO,
            Provider::Linkedin => linkedin::INFO,
            Provider::Microsoft => microsoft::INFO,
            Provider::Talkdesk => talkdesk::INFO,
        }
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Compiled-in catalog, for providers that ship one
    pub fn static_catalog(self) -> Option<Result<Arc<StaticSchemaStore>>> {
        match self {
            Provider::Aircall => Some(catalog(&aircall::CATALOG)),
            Provider::Groove => Some(catalog(&groove::CATALOG)),
            _ => None,
        }
    }

    fn binding(self, resolved: &ResolvedParams) -> Result<Box<dyn ProviderBinding>> {
        match self {
            Provider::Aircall => aircall::binding(resolved),
            Provider::Braintree => braintree::binding(resolved),
            Provider::Expensify => expensify::binding(resolved),
            Provider::Groove => groove::binding(resolved),
            Provider::Linkedin => linkedin::binding(resolved),
            Provider::Microsoft => microsoft::binding(resolved),
            Provider::Talkdesk => talkdesk::binding(resolved),
        }
    }

    /// Build a connector for this provider
    pub fn connector(self, params: ConnectorParams) -> Result<GenericConnector> {
        ConnectorBuilder::new(self.info(), params).build(|resolved| self.binding(resolved))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::config(format!("unknown provider '{s}'")))
    }
}

// ============================================================================
// Embedded catalogs
// ============================================================================

type CatalogCell = LazyLock<std::result::Result<Arc<StaticSchemaStore>, String>>;

fn load_catalog(raw: &str) -> std::result::Result<Arc<StaticSchemaStore>, String> {
    StaticSchemaStore::from_json(raw)
        .map(Arc::new)
        .map_err(|e| e.to_string())
}

fn catalog(cell: &CatalogCell) -> Result<Arc<StaticSchemaStore>> {
    LazyLock::force(cell)
        .as_ref()
        .map(Arc::clone)
        .map_err(|e| Error::schema(e.clone()))
}

#[cfg(test)]
mod tests;
