//! The root scope a registry is bound to.

use crate::content::RoleSet;
use std::fmt;

/// Identity of a context (e.g. one editor view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// A view together with the roles it plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContext {
    /// Identity of the view
    pub id: ContextId,
    /// Roles the view plays
    pub roles: RoleSet,
}

impl ViewContext {
    /// Create a context.
    pub fn new(id: u64, roles: RoleSet) -> Self {
        Self {
            id: ContextId(id),
            roles,
        }
    }
}
