mod placeholder;

pub use placeholder::PlaceholderHelper;

use crate::error::{ContextError, Result};
use dashmap::DashMap;
use serde::Deserialize;
use std::env;
use std::sync::Arc;

/// String property source consulted for placeholder resolution.
///
/// Clones share the same underlying map.
#[derive(Clone, Default, Debug)]
pub struct Environment {
    properties: Arc<DashMap<String, String>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment pre-populated with the process environment variables.
    pub fn from_env() -> Self {
        let environment = Self::default();
        for (key, value) in env::vars() {
            environment.set(&key, &value);
        }
        environment
    }

    pub fn with_property(self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.properties.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.properties.insert(key.to_string(), value.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Resolve `${...}` placeholders, leaving unknown names untouched.
    pub fn resolve_placeholders(&self, text: &str) -> Result<String> {
        PlaceholderHelper::new("${", "}", Some(":"), true).replace_placeholders(text, |k| self.get(k))
    }

    /// Resolve `${...}` placeholders, failing on unknown names.
    pub fn resolve_required_placeholders(&self, text: &str) -> Result<String> {
        PlaceholderHelper::default().replace_placeholders(text, |k| self.get(k))
    }
}

/// Settings for a context bootstrap.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub display_name: String,
    pub allow_definition_overriding: bool,
    pub placeholder_prefix: String,
    pub placeholder_suffix: String,
    pub value_separator: Option<String>,
    pub ignore_unresolvable_placeholders: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            display_name: "application".to_string(),
            allow_definition_overriding: true,
            placeholder_prefix: "${".to_string(),
            placeholder_suffix: "}".to_string(),
            value_separator: Some(":".to_string()),
            ignore_unresolvable_placeholders: false,
        }
    }
}

impl ContextConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ContextError::config(e.to_string()))
    }

    /// Read overrides from `MESHESTRA_*` keys, falling back to defaults.
    pub fn from_environment(environment: &Environment) -> Result<Self> {
        let mut config = Self::default();
        if let Some(name) = environment.get("MESHESTRA_DISPLAY_NAME") {
            config.display_name = name;
        }
        if let Some(flag) = environment.get("MESHESTRA_ALLOW_DEFINITION_OVERRIDING") {
            config.allow_definition_overriding = parse_flag("MESHESTRA_ALLOW_DEFINITION_OVERRIDING", &flag)?;
        }
        if let Some(prefix) = environment.get("MESHESTRA_PLACEHOLDER_PREFIX") {
            config.placeholder_prefix = prefix;
        }
        if let Some(suffix) = environment.get("MESHESTRA_PLACEHOLDER_SUFFIX") {
            config.placeholder_suffix = suffix;
        }
        if let Some(separator) = environment.get("MESHESTRA_VALUE_SEPARATOR") {
            config.value_separator = (!separator.is_empty()).then_some(separator);
        }
        if let Some(flag) = environment.get("MESHESTRA_IGNORE_UNRESOLVABLE_PLACEHOLDERS") {
            config.ignore_unresolvable_placeholders =
                parse_flag("MESHESTRA_IGNORE_UNRESOLVABLE_PLACEHOLDERS", &flag)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.placeholder_prefix.is_empty() || self.placeholder_suffix.is_empty() {
            return Err(ContextError::config(
                "placeholder prefix and suffix must not be empty",
            ));
        }
        Ok(())
    }

    pub fn placeholder_helper(&self) -> PlaceholderHelper {
        PlaceholderHelper::new(
            self.placeholder_prefix.as_str(),
            self.placeholder_suffix.as_str(),
            self.value_separator.as_deref(),
            self.ignore_unresolvable_placeholders,
        )
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ContextError::config(format!(
            "{key} expects a boolean, got '{other}'"
        ))),
    }
}
