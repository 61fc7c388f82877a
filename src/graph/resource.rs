//! Resources, graph events and the host-side graph interface.

use crate::content::ContentType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identity of a resource within a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A snapshot of a content-tagged item in a resource graph (e.g. a text buffer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    /// Identity of the resource
    pub id: ResourceId,
    /// Content type at the time of the snapshot
    pub content_type: ContentType,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.content_type)
    }
}

impl Resource {
    /// Create a resource snapshot.
    pub fn new(id: u64, content_type: impl Into<ContentType>) -> Self {
        Self {
            id: ResourceId(id),
            content_type: content_type.into(),
        }
    }

    /// The same resource carrying a different tag.
    pub fn retagged(&self, content_type: ContentType) -> Self {
        Self {
            id: self.id,
            content_type,
        }
    }
}

/// A single content-type change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retag {
    /// The resource, carrying its new tag
    pub resource: Resource,
    /// Tag before the change
    pub before: ContentType,
    /// Tag after the change
    pub after: ContentType,
}

impl Retag {
    /// Describe a retag of `resource` (given with its old tag) to `after`.
    pub fn new(resource: &Resource, after: impl Into<ContentType>) -> Self {
        let after = after.into();
        Self {
            resource: resource.retagged(after.clone()),
            before: resource.content_type.clone(),
            after,
        }
    }
}

/// Structural change notifications emitted by a resource graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    /// Resources joined and/or left the graph.
    ResourcesChanged {
        /// Newly reachable resources
        added: Vec<Resource>,
        /// Resources no longer reachable, with their last known tags
        removed: Vec<Resource>,
    },
    /// One resource changed its content type.
    ResourceRetagged(Retag),
    /// Several resources changed their content types in one structural change.
    ResourcesRetagged(Vec<Retag>),
}

/// Handle identifying a graph subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Receiver of graph change notifications.
pub trait GraphListener: Send + Sync {
    /// Called synchronously after the graph has changed.
    fn on_graph_event(&self, event: &GraphEvent);
}

/// The host's resource graph as seen from one context.
///
/// Hosts implement this trait over their own buffer graph. The registry
/// subscribes on construction and unsubscribes explicitly on close.
pub trait ResourceGraph: Send + Sync {
    /// All resources currently reachable from the context that satisfy `predicate`.
    fn resources_matching(&self, predicate: &dyn Fn(&Resource) -> bool) -> Vec<Resource>;

    /// Start delivering change notifications to `listener`.
    fn subscribe(&self, listener: Arc<dyn GraphListener>) -> SubscriptionId;

    /// Stop delivering notifications for `id`. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}
