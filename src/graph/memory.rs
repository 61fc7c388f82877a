//! In-memory resource graph.

use super::{GraphEvent, GraphListener, Resource, ResourceGraph, ResourceId, Retag, SubscriptionId};
use crate::content::ContentType;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A thread-safe, in-memory [`ResourceGraph`].
///
/// State is updated first and subscribers are notified afterwards, outside
/// the internal lock. Useful for hosts without a graph of their own, and for
/// driving registries in tests.
///
/// # Examples
///
/// ```rust
/// use content_listeners::graph::{MemoryGraph, ResourceGraph};
///
/// let graph = MemoryGraph::new();
/// let buffer = graph.insert("text/plain");
/// graph.retag(buffer.id, "code/rust");
///
/// assert_eq!(graph.resources_matching(&|_| true).len(), 1);
/// ```
#[derive(Default)]
pub struct MemoryGraph {
    inner: Mutex<MemoryGraphInner>,
}

#[derive(Default)]
struct MemoryGraphInner {
    resources: BTreeMap<ResourceId, Resource>,
    listeners: Vec<(SubscriptionId, Arc<dyn GraphListener>)>,
    next_resource: u64,
    next_subscription: u64,
}

impl MemoryGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph already holding `resources`, without emitting events.
    pub fn with_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        let graph = Self::new();
        {
            let mut inner = graph.inner.lock();
            for resource in resources {
                inner.track(resource.id);
                inner.resources.insert(resource.id, resource);
            }
        }
        graph
    }

    /// Add a new resource with a fresh id and notify subscribers.
    ///
    /// Ids count up from the largest id seen so far. Once that reaches
    /// `u64::MAX` the lowest unused id is taken instead.
    pub fn insert(&self, content_type: impl Into<ContentType>) -> Resource {
        let resource = {
            let mut inner = self.inner.lock();
            let id = inner.allocate();
            Resource::new(id.0, content_type)
        };
        self.change(vec![resource.clone()], &[]);
        resource
    }

    /// Add resources. Ids already present are ignored.
    pub fn add(&self, resources: Vec<Resource>) -> Vec<Resource> {
        self.change(resources, &[]).0
    }

    /// Remove resources by id. Unknown ids are ignored.
    pub fn remove(&self, ids: &[ResourceId]) -> Vec<Resource> {
        self.change(Vec::new(), ids).1
    }

    /// Add and remove in one structural change, emitting a single event.
    ///
    /// Returns the resources actually added and removed. No event is emitted
    /// when nothing changed.
    pub fn change(&self, added: Vec<Resource>, removed: &[ResourceId]) -> (Vec<Resource>, Vec<Resource>) {
        let (added, removed, listeners) = {
            let mut inner = self.inner.lock();

            let removed: Vec<Resource> = removed
                .iter()
                .filter_map(|id| inner.resources.remove(id))
                .collect();

            let mut inserted = Vec::with_capacity(added.len());
            for resource in added {
                if inner.resources.contains_key(&resource.id) {
                    continue;
                }
                inner.track(resource.id);
                inner.resources.insert(resource.id, resource.clone());
                inserted.push(resource);
            }

            (inserted, removed, inner.listener_snapshot())
        };

        if !added.is_empty() || !removed.is_empty() {
            let event = GraphEvent::ResourcesChanged {
                added: added.clone(),
                removed: removed.clone(),
            };
            notify(&listeners, &event);
        }

        (added, removed)
    }

    /// Change the content type of one resource.
    ///
    /// Returns `None` without notifying when the id is unknown or the tag is unchanged.
    pub fn retag(&self, id: ResourceId, content_type: impl Into<ContentType>) -> Option<Retag> {
        let (retag, listeners) = {
            let mut inner = self.inner.lock();
            let retag = inner.apply_retag(id, content_type.into())?;
            (retag, inner.listener_snapshot())
        };

        notify(&listeners, &GraphEvent::ResourceRetagged(retag.clone()));
        Some(retag)
    }

    /// Change the content types of several resources in one structural change.
    pub fn retag_many(&self, changes: Vec<(ResourceId, ContentType)>) -> Vec<Retag> {
        let (retags, listeners) = {
            let mut inner = self.inner.lock();
            let retags: Vec<Retag> = changes
                .into_iter()
                .filter_map(|(id, content_type)| inner.apply_retag(id, content_type))
                .collect();
            (retags, inner.listener_snapshot())
        };

        if !retags.is_empty() {
            notify(&listeners, &GraphEvent::ResourcesRetagged(retags.clone()));
        }
        retags
    }

    /// Look up a resource by id.
    pub fn resource(&self, id: ResourceId) -> Option<Resource> {
        self.inner.lock().resources.get(&id).cloned()
    }

    /// Number of resources in the graph.
    pub fn len(&self) -> usize {
        self.inner.lock().resources.len()
    }

    /// Whether the graph holds no resources.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

impl MemoryGraphInner {
    fn track(&mut self, id: ResourceId) {
        self.next_resource = self.next_resource.max(id.0.saturating_add(1));
    }

    fn allocate(&mut self) -> ResourceId {
        let candidate = ResourceId(self.next_resource);
        if !self.resources.contains_key(&candidate) {
            self.track(candidate);
            return candidate;
        }
        (0..=u64::MAX)
            .map(ResourceId)
            .find(|id| !self.resources.contains_key(id))
            .unwrap_or(candidate)
    }
    fn listener_snapshot(&self) -> Vec<Arc<dyn GraphListener>> {
        self.listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    fn apply_retag(&mut self, id: ResourceId, after: ContentType) -> Option<Retag> {
        let resource = self.resources.get_mut(&id)?;
        if resource.content_type == after {
            return None;
        }
        let retag = Retag::new(resource, after.clone());
        resource.content_type = after;
        Some(retag)
    }
}

fn notify(listeners: &[Arc<dyn GraphListener>], event: &GraphEvent) {
    for listener in listeners {
        listener.on_graph_event(event);
    }
}

impl ResourceGraph for MemoryGraph {
    fn resources_matching(&self, predicate: &dyn Fn(&Resource) -> bool) -> Vec<Resource> {
        self.inner
            .lock()
            .resources
            .values()
            .filter(|resource| predicate(resource))
            .cloned()
            .collect()
    }

    fn subscribe(&self, listener: Arc<dyn GraphListener>) -> SubscriptionId {
        let mut inner = self.inner.lock();
        let id = SubscriptionId(inner.next_subscription);
        inner.next_subscription += 1;
        inner.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.lock().listeners.retain(|(sub_id, _)| *sub_id != id);
    }
}

impl std::fmt::Debug for MemoryGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MemoryGraph")
            .field("resources", &inner.resources.len())
            .field("subscribers", &inner.listeners.len())
            .finish()
    }
}
