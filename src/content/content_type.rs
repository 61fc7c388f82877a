//! Hierarchical content-type tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A hierarchical, case-insensitive content-type tag such as `text/plain`.
///
/// Segments are separated by `/`. A tag is-a each of its ancestors, so
/// `code/rust` is-a `code`. Every tag is-a [`ContentType::ANY`].
///
/// # Examples
///
/// ```rust
/// use content_listeners::content::ContentType;
///
/// let plain = ContentType::new("Text/Plain");
/// assert_eq!(plain.as_str(), "text/plain");
/// assert!(plain.is_a(&ContentType::new("text")));
/// assert!(!plain.is_a(&ContentType::new("text/markdown")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ContentType(String);

impl ContentType {
    /// Name of the root pattern every tag matches.
    pub const ANY: &'static str = "any";

    /// Create a tag, normalizing case and stray separators.
    pub fn new(tag: impl AsRef<str>) -> Self {
        let normalized = tag
            .as_ref()
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("/");

        if normalized.is_empty() {
            Self(Self::ANY.to_string())
        } else {
            Self(normalized)
        }
    }

    /// The root tag.
    pub fn any() -> Self {
        Self(Self::ANY.to_string())
    }

    /// Whether this is the root tag.
    pub fn is_any(&self) -> bool {
        self.0 == Self::ANY
    }

    /// The normalized tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The immediate path ancestor, if any.
    ///
    /// Top-level tags have no parent; they only relate to [`ContentType::ANY`].
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// Path-only subtype test: is this tag equal to or below `pattern`?
    pub fn is_a(&self, pattern: &ContentType) -> bool {
        if pattern.is_any() || self == pattern {
            return true;
        }
        self.0
            .strip_prefix(pattern.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for ContentType {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl From<ContentType> for String {
    fn from(tag: ContentType) -> Self {
        tag.0
    }
}
