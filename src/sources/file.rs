//! File-based settings source.

use super::SettingsSource;
use crate::error::{RegistryError, Result};
use config::File;
use std::collections::HashMap;
use std::path::PathBuf;

/// Reads registry settings from a YAML, TOML or JSON file.
///
/// The format follows the file extension.
///
/// # Examples
///
/// ```rust,no_run
/// use content_listeners::sources::FileSource;
///
/// let source = FileSource::new("listeners.yaml");
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    priority: i32,
}

impl FileSource {
    /// Create a file source.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            priority: 100,
        }
    }

    /// Override the default priority of 100.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn check_extension(&self) -> Result<()> {
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                RegistryError::LoadError(format!(
                    "Cannot tell settings format of {}",
                    self.path.display()
                ))
            })?;

        match extension {
            "yaml" | "yml" | "toml" | "json" => Ok(()),
            other => Err(RegistryError::LoadError(format!(
                "Unsupported settings extension '.{}' (expected .yaml, .yml, .toml or .json)",
                other
            ))),
        }
    }
}

impl SettingsSource for FileSource {
    fn load(&self) -> Result<HashMap<String, config::Value>> {
        self.check_extension()?;

        if !self.path.exists() {
            return Err(RegistryError::LoadError(format!(
                "Settings file not found: {}",
                self.path.display()
            )));
        }

        config::Config::builder()
            .add_source(File::from(self.path.clone()).required(true))
            .build()
            .map_err(|e| RegistryError::LoadError(format!("Failed to read settings file: {}", e)))?
            .try_deserialize::<HashMap<String, config::Value>>()
            .map_err(|e| {
                RegistryError::DeserializationError(format!("Failed to parse settings file: {}", e))
            })
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
