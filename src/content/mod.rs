//! Content types, subtype relations and view roles.

mod content_type;
mod relation;
mod roles;

pub use content_type::ContentType;
pub use relation::{ContentTypeRegistry, PathRelation, TypeRelation};
pub use roles::RoleSet;
