//! Registry settings and their loading.
//!
//! Settings can be built in code or loaded from files and environment
//! variables, later sources overriding earlier ones:
//!
//! ```rust,no_run
//! use content_listeners::settings::{RegistrySettings, RetagOrdering};
//!
//! # fn example() -> content_listeners::error::Result<()> {
//! let settings = RegistrySettings::builder()
//!     .with_file("config/listeners.yaml")
//!     .with_env_overrides("LISTENERS", "__")
//!     .build()?;
//!
//! assert_eq!(settings.retag_ordering, RetagOrdering::WholeChange);
//! # Ok(())
//! # }
//! ```

mod builder;
mod loader;

pub use builder::SettingsBuilder;
pub use loader::SettingsLoader;

use serde::{Deserialize, Serialize};

/// How a batch of retags is split into disconnect and connect phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetagOrdering {
    /// Every disconnect caused by the batch is delivered before any connect.
    #[default]
    WholeChange,
    /// Each retag in the batch gets its own disconnect-then-connect pass.
    PerResource,
}

/// Tunables for a [`ListenerRegistry`](crate::core::ListenerRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Phase granularity for batched retags
    pub retag_ordering: RetagOrdering,
    /// Turn handler panics into reported faults instead of unwinding
    pub catch_panics: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            retag_ordering: RetagOrdering::WholeChange,
            catch_panics: true,
        }
    }
}

impl RegistrySettings {
    /// Start loading settings from files and the environment.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Set the retag ordering.
    pub fn with_retag_ordering(mut self, ordering: RetagOrdering) -> Self {
        self.retag_ordering = ordering;
        self
    }

    /// Enable or disable panic isolation.
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }
}
