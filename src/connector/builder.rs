//! Connector assembly
//!
//! Construction always runs in the same order:
//!
//! 1. Provider info resolution (templates, workspace, required metadata, credentials)
//! 2. HTTP client with the provider's error handler
//! 3. Endpoint registry
//! 4. Metadata strategy and custom-field memo
//! 5. Read, write and delete pipelines

use super::binding::ProviderBinding;
use super::custom_fields::CustomFieldCache;
use super::generic::GenericConnector;
use super::types::{AuthScheme, ConnectorParams, ProviderInfo, ResolvedParams};
use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig};
use crate::pipeline::{Deleter, Reader, Writer};
use crate::registry::EndpointRegistry;
use crate::template::{render, TemplateContext};
use std::sync::Arc;
use tracing::info;

pub struct ConnectorBuilder {
    info: ProviderInfo,
    params: ConnectorParams,
}

impl ConnectorBuilder {
    pub fn new(info: ProviderInfo, params: ConnectorParams) -> Self {
        Self { info, params }
    }

    /// Check the params against the provider and render its templates
    pub fn resolve(&self) -> Result<ResolvedParams> {
        let info = &self.info;
        let params = &self.params;

        let workspace = params.workspace.clone().filter(|w| !w.is_empty());
        if info.requires_workspace && workspace.is_none() {
            return Err(Error::missing_field("workspace"));
        }
        for key in info.required_metadata {
            if !params.metadata.contains_key(*key) {
                return Err(Error::missing_field(format!("metadata.{key}")));
            }
        }

        let module = params
            .module
            .clone()
            .unwrap_or_else(|| info.default_module().to_string());
        if !info.modules.contains(&module.as_str()) {
            return Err(Error::config(format!(
                "unknown module '{module}' for provider '{}'",
                info.name
            )));
        }

        let mut ctx = TemplateContext::new().with_metadata(params.metadata.clone());
        if let Some(ws) = &workspace {
            ctx = ctx.with_workspace(ws.clone());
        }

        let base_url = match &params.base_url {
            Some(url) => url.clone(),
            None => render(info.base_url, &ctx)?,
        };

        if !info.auth.accepts(&params.auth) {
            return Err(Error::auth(format!(
                "{} expects {} credentials, got {}",
                info.name,
                info.auth,
                params.auth.scheme()
            )));
        }

        let mut auth = params.auth.clone();
        if let (
            AuthConfig::Oauth2Refresh { token_url, .. }
            | AuthConfig::Oauth2ClientCredentials { token_url, .. },
            Some(template),
        ) = (&mut auth, info.token_url)
        {
            if token_url.is_empty() {
                *token_url = render(template, &ctx)?;
            }
        }
        auth.validate()?;

        Ok(ResolvedParams {
            base_url,
            module,
            auth,
            workspace,
            metadata: params.metadata.clone(),
            http: params.http.clone(),
        })
    }

    /// Resolve, then assemble the connector around the binding `bind` returns
    pub fn build<F>(self, bind: F) -> Result<GenericConnector>
    where
        F: FnOnce(&ResolvedParams) -> Result<Box<dyn ProviderBinding>>,
    {
        let resolved = self.resolve()?;
        let binding = bind(&resolved)?;

        let mut config = HttpClientConfig::builder()
            .base_url(resolved.base_url.clone())
            .timeout(resolved.http.timeout);
        if let Some(agent) = &resolved.http.user_agent {
            config = config.user_agent(agent.clone());
        }
        if let Some(limit) = resolved.http.rate_limit {
            config = config.rate_limit(limit);
        }
        for (name, value) in binding.default_headers() {
            config = config.header(name, value);
        }

        let client_auth = match self.info.auth {
            AuthScheme::BodyCredentials => AuthConfig::None,
            _ => resolved.auth.clone(),
        };
        let client = Arc::new(
            HttpClient::new(config.build(), client_auth)?.with_error_handler(binding.error_handler()),
        );

        let registry = Arc::new(EndpointRegistry::new(binding.endpoints())?);

        let module = resolved.module.clone();
        let schema = binding.schema_provider(&client, &module);
        let custom_fields = binding
            .custom_fields(&client)
            .map(CustomFieldCache::new);

        let reader = binding.read_handler().map(|h| {
            Reader::new(Arc::clone(&client), Arc::clone(&registry), h, module.clone())
        });
        let writer = binding.write_handler().map(|h| {
            Writer::new(Arc::clone(&client), Arc::clone(&registry), h, module.clone())
        });
        let deleter = binding.delete_handler().map(|h| {
            Deleter::new(Arc::clone(&client), Arc::clone(&registry), h, module.clone())
        });

        info!(
            provider = self.info.name,
            module = %module,
            base_url = %resolved.base_url,
            auth = %self.info.auth,
            "Connector ready"
        );

        Ok(GenericConnector {
            info: self.info,
            module,
            client,
            registry,
            schema,
            custom_fields,
            reader,
            writer,
            deleter,
        })
    }
}
