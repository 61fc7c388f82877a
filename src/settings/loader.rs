//! Merges settings sources by priority.

use crate::error::{RegistryError, Result};
use crate::sources::SettingsSource;
use serde::de::DeserializeOwned;

/// Loads and merges settings from several sources.
///
/// Sources are applied lowest priority first, so higher priorities override.
#[derive(Default)]
pub struct SettingsLoader {
    sources: Vec<Box<dyn SettingsSource>>,
}

impl SettingsLoader {
    /// Create a loader without sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source.
    pub fn add_source(&mut self, source: Box<dyn SettingsSource>) {
        self.sources.push(source);
    }

    /// Whether no sources were added.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Merge all sources and deserialize the result.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no sources, a source fails to load, or
    /// the merged values do not deserialize into `T`.
    pub fn load<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if self.sources.is_empty() {
            return Err(RegistryError::LoadError(
                "No settings sources specified".to_string(),
            ));
        }

        let mut builder = config::Config::builder();
        for source in self.sorted() {
            let values = source.load().map_err(|e| {
                RegistryError::LoadError(format!("Source '{}' failed: {}", source.name(), e))
            })?;

            for (key, value) in values {
                builder = builder.set_override(&key, value).map_err(|e| {
                    RegistryError::LoadError(format!(
                        "Failed to merge '{}' from '{}': {}",
                        key,
                        source.name(),
                        e
                    ))
                })?;
            }
        }

        builder
            .build()
            .map_err(|e| RegistryError::LoadError(format!("Failed to merge settings: {}", e)))?
            .try_deserialize::<T>()
            .map_err(|e| RegistryError::DeserializationError(e.to_string()))
    }

    /// Source names, lowest priority first.
    pub fn source_names(&self) -> Vec<String> {
        self.sorted().map(|source| source.name()).collect()
    }

    fn sorted(&self) -> impl Iterator<Item = &dyn SettingsSource> {
        let mut sources: Vec<&dyn SettingsSource> =
            self.sources.iter().map(|source| source.as_ref()).collect();
        sources.sort_by_key(|source| source.priority());
        sources.into_iter()
    }
}

impl std::fmt::Debug for SettingsLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsLoader")
            .field("sources", &self.source_names())
            .finish()
    }
}
