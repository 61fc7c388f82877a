//! Subtype relations over content types.

use super::ContentType;
use std::collections::{HashMap, HashSet, VecDeque};

/// The host's subtype-matching relation.
///
/// Implement this trait to plug an editor's own content-type registry into
/// the listener registry. Answers must stay stable while any registry uses
/// the relation: disconnects are computed from current answers, so a relation
/// that starts matching new pairs mid-life would disconnect pairs that were
/// never connected.
pub trait TypeRelation: Send + Sync {
    /// Whether `tag` is-a `pattern`.
    fn is_of_type(&self, tag: &ContentType, pattern: &ContentType) -> bool;
}

/// Relation based purely on tag paths (`text/plain` is-a `text`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PathRelation;

impl TypeRelation for PathRelation {
    fn is_of_type(&self, tag: &ContentType, pattern: &ContentType) -> bool {
        tag.is_a(pattern)
    }
}

/// Content-type registry with declared base types.
///
/// On top of path ancestry, any tag may declare additional base types, so
/// `code/rust` can be declared a kind of `text` even though the paths differ.
/// Declarations are inherited by path descendants.
///
/// Declarations need `&mut self`, so the hierarchy is complete before it is
/// shared behind an `Arc` and frozen from then on.
///
/// # Examples
///
/// ```rust
/// use content_listeners::content::{ContentType, ContentTypeRegistry, TypeRelation};
///
/// let registry = ContentTypeRegistry::new().with_bases("code", ["text"]);
///
/// let rust = ContentType::new("code/rust");
/// assert!(registry.is_of_type(&rust, &ContentType::new("text")));
/// ```
///
/// Once shared, the hierarchy can no longer change:
///
/// ```rust,compile_fail
/// use content_listeners::content::ContentTypeRegistry;
/// use std::sync::Arc;
///
/// let shared = Arc::new(ContentTypeRegistry::new());
/// shared.declare("code", ["text"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContentTypeRegistry {
    bases: HashMap<ContentType, Vec<ContentType>>,
}

impl ContentTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare base types for `tag`. Repeated declarations accumulate.
    pub fn declare<I, B>(&mut self, tag: impl Into<ContentType>, bases: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<ContentType>,
    {
        let tag = tag.into();
        let entry = self.bases.entry(tag.clone()).or_default();
        for base in bases {
            let base = base.into();
            if base != tag && !entry.contains(&base) {
                entry.push(base);
            }
        }
    }

    /// Builder form of [`declare`](Self::declare).
    pub fn with_bases<I, B>(mut self, tag: impl Into<ContentType>, bases: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<ContentType>,
    {
        self.declare(tag, bases);
        self
    }

    /// Base types declared directly on `tag`.
    pub fn declared_bases(&self, tag: &ContentType) -> &[ContentType] {
        self.bases.get(tag).map(Vec::as_slice).unwrap_or_default()
    }
}

impl TypeRelation for ContentTypeRegistry {
    fn is_of_type(&self, tag: &ContentType, pattern: &ContentType) -> bool {
        if tag.is_a(pattern) {
            return true;
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([tag.clone()]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if current.is_a(pattern) {
                return true;
            }

            // Declarations on any path ancestor apply to the descendant too.
            let mut node = Some(current);
            while let Some(ancestor) = node {
                if let Some(bases) = self.bases.get(&ancestor) {
                    queue.extend(bases.iter().cloned());
                }
                node = ancestor.parent();
            }
        }

        false
    }
}
