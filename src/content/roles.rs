//! View roles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A set of case-insensitive view role names (`editable`, `interactive`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// Create an empty role set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role, returning the updated set.
    pub fn with(mut self, role: impl AsRef<str>) -> Self {
        self.insert(role);
        self
    }

    /// Add a role.
    pub fn insert(&mut self, role: impl AsRef<str>) {
        let role = role.as_ref().trim().to_ascii_lowercase();
        if !role.is_empty() {
            self.0.insert(role);
        }
    }

    /// Whether the set holds `role`.
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(&role.trim().to_ascii_lowercase())
    }

    /// Whether the two sets share at least one role.
    pub fn contains_any(&self, other: &RoleSet) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of roles.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the roles in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Match an observer's role pattern (`self`) against a context's roles.
    ///
    /// An empty pattern matches every context.
    pub fn admits(&self, context_roles: &RoleSet) -> bool {
        self.is_empty() || self.contains_any(context_roles)
    }
}

impl<S: AsRef<str>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, role) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", role)?;
        }
        write!(f, "}}")
    }
}
