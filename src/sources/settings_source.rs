//! Settings source trait.

use crate::error::Result;
use std::collections::HashMap;

/// A place registry settings can be read from.
///
/// Sources yield flat key/value maps that the
/// [`SettingsLoader`](crate::settings::SettingsLoader) merges by priority.
pub trait SettingsSource: Send + Sync {
    /// Load raw values keyed by setting name.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or parsed.
    fn load(&self) -> Result<HashMap<String, config::Value>>;

    /// Human-readable name used in error messages and logs.
    fn name(&self) -> String;

    /// Precedence of this source; higher wins.
    ///
    /// Files default to 100 and environment overrides to 300.
    fn priority(&self) -> i32 {
        100
    }
}
