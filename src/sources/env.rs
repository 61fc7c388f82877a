//! Environment variable settings source.

use super::SettingsSource;
use crate::error::{RegistryError, Result};
use config::Environment;
use std::collections::HashMap;

/// Reads registry settings from prefixed environment variables.
///
/// With prefix `LISTENERS` and separator `__`, `LISTENERS_RETAG_ORDERING=per_resource`
/// sets `retag_ordering`.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
    priority: i32,
}

impl EnvSource {
    /// Create an environment source. Priority defaults to 300.
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            priority: 300,
        }
    }

    /// Override the default priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl SettingsSource for EnvSource {
    fn load(&self) -> Result<HashMap<String, config::Value>> {
        let environment = Environment::with_prefix(&self.prefix)
            .prefix_separator("_")
            .separator(&self.separator)
            .try_parsing(true);

        config::Config::builder()
            .add_source(environment)
            .build()
            .map_err(|e| {
                RegistryError::LoadError(format!("Failed to read environment settings: {}", e))
            })?
            .try_deserialize::<HashMap<String, config::Value>>()
            .map_err(|e| {
                RegistryError::DeserializationError(format!(
                    "Failed to parse environment settings: {}",
                    e
                ))
            })
    }

    fn name(&self) -> String {
        format!("env:{}*", self.prefix)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
