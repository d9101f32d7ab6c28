//! Template interpolation for provider URLs and config files
//!
//! Handles `{{ variable }}` interpolation. Three roots are understood:
//!
//! - `{{ workspace }}`: the connector's workspace
//! - `{{ metadata.region }}`: a connector metadata entry
//! - `{{ env.API_KEY }}`: an environment variable
//!
//! A bare `{{ region }}` falls back to the metadata entry of that name.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}").ok()
});

/// Where `env.*` variables come from
#[derive(Debug, Clone, Default)]
enum EnvSource {
    #[default]
    Process,
    Fixed(HashMap<String, String>),
}

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub workspace: Option<String>,
    pub metadata: BTreeMap<String, String>,
    env: EnvSource,
}

impl TemplateContext {
    /// Empty context reading `env.*` from the process environment
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Use a fixed map instead of the process environment
    #[must_use]
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = EnvSource::Fixed(env);
        self
    }

    /// Get a value by path (e.g., "metadata.region")
    pub fn get(&self, path: &str) -> Option<String> {
        match path.split_once('.') {
            None if path == "workspace" => self.workspace.clone(),
            None => self.metadata.get(path).cloned(),
            Some(("metadata", key)) => self.metadata.get(key).cloned(),
            Some(("env", name)) => match &self.env {
                EnvSource::Process => std::env::var(name).ok(),
                EnvSource::Fixed(vars) => vars.get(name).cloned(),
            },
            Some(_) => None,
        }
    }
}

/// Render a template string with the given context
///
/// Every undefined variable is reported in one `UndefinedVariable` error.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let Some(regex) = TEMPLATE_REGEX.as_ref() else {
        return Err(Error::template("template pattern failed to compile"));
    };

    let mut missing = Vec::new();
    let rendered = regex.replace_all(template, |caps: &regex::Captures<'_>| {
        let var_path = &caps[1];
        match ctx.get(var_path) {
            Some(value) => value,
            None => {
                missing.push(var_path.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.as_ref().is_some_and(|r| r.is_match(s))
}
