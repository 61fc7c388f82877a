//! Builder for loading [`RegistrySettings`].

use super::{RegistrySettings, SettingsLoader};
use crate::error::Result;
use crate::sources::{EnvSource, FileSource, SettingsSource};
use std::path::PathBuf;

/// Fluent loader for registry settings.
///
/// Files are applied in the order given, each overriding the previous, and
/// environment overrides win over all files. With no sources at all the
/// defaults are returned.
#[derive(Default)]
pub struct SettingsBuilder {
    file_paths: Vec<PathBuf>,
    env: Option<(String, String)>,
    custom_sources: Vec<Box<dyn SettingsSource>>,
}

impl SettingsBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a YAML, TOML or JSON settings file.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_paths.push(path.into());
        self
    }

    /// Read overrides from `<PREFIX>_<KEY>` environment variables.
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env = Some((prefix.to_string(), separator.to_string()));
        self
    }

    /// Add a custom source.
    pub fn with_source<S: SettingsSource + 'static>(mut self, source: S) -> Self {
        self.custom_sources.push(Box::new(source));
        self
    }

    /// Load and merge all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or the merged values are invalid.
    pub fn build(self) -> Result<RegistrySettings> {
        let mut loader = SettingsLoader::new();

        for (index, path) in self.file_paths.into_iter().enumerate() {
            let priority = 100 + index as i32 * 10;
            loader.add_source(Box::new(FileSource::new(path).with_priority(priority)));
        }

        for source in self.custom_sources {
            loader.add_source(source);
        }

        if let Some((prefix, separator)) = self.env {
            loader.add_source(Box::new(EnvSource::new(prefix, separator)));
        }

        if loader.is_empty() {
            return Ok(RegistrySettings::default());
        }

        let settings: RegistrySettings = loader.load()?;
        tracing::debug!(
            sources = ?loader.source_names(),
            retag_ordering = ?settings.retag_ordering,
            catch_panics = settings.catch_panics,
            "Loaded registry settings"
        );
        Ok(settings)
    }
}
