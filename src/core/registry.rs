//! The per-context listener registry.

use super::delivery::{Direction, Notice, Reporter, deliver_all, guarded};
use super::observer::{HandlerState, ObserverSlot};
use super::{ConnectionListener, ConnectionReason, ListenerRegistryBuilder, ObserverDescriptor};
use crate::content::TypeRelation;
use crate::error::{FaultKind, ObserverFault};
use crate::graph::{
    GraphEvent, GraphListener, Resource, ResourceGraph, Retag, SubscriptionId, ViewContext,
};
use crate::settings::{RegistrySettings, RetagOrdering};
use parking_lot::Mutex;
use std::sync::Arc;

/// Routes resource-graph changes of one view to the observers that care.
///
/// A registry is created when a view opens and closed when it closes. It
/// keeps only the candidate observers whose role pattern admits the view,
/// instantiates their handlers lazily on the first connect, and delivers
/// `connected`/`disconnected` so that for every (observer, resource) pair the
/// two strictly alternate, starting with a connect.
///
/// Deliveries are planned under an internal lock and performed after it is
/// released. Graph changes must arrive serially; mutating the graph from
/// inside a callback is not supported.
///
/// # Examples
///
/// ```rust
/// use content_listeners::prelude::*;
/// use std::sync::Arc;
///
/// # struct Spell;
/// # impl ConnectionListener for Spell {
/// #     fn connected(&self, _: &ViewContext, _: ConnectionReason, _: &[Resource]) -> Result<(), ListenerError> { Ok(()) }
/// #     fn disconnected(&self, _: &ViewContext, _: ConnectionReason, _: &[Resource]) -> Result<(), ListenerError> { Ok(()) }
/// # }
/// let graph = Arc::new(MemoryGraph::new());
/// let view = ViewContext::new(1, RoleSet::new().with("editable"));
///
/// let registry = ListenerRegistry::create(
///     view,
///     graph.clone(),
///     Arc::new(PathRelation),
///     vec![ObserverDescriptor::new("spell", || Ok(Spell)).with_content_type("text")],
/// );
///
/// graph.insert("text/plain");
/// assert!(registry.is_active("spell"));
///
/// registry.close();
/// ```
pub struct ListenerRegistry {
    inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    context: Arc<ViewContext>,
    graph: Arc<dyn ResourceGraph>,
    relation: Arc<dyn TypeRelation>,
    settings: RegistrySettings,
    reporter: Reporter,
    state: Mutex<RegistryState>,
}

struct RegistryState {
    observers: Vec<ObserverSlot>,
    subscription: Option<SubscriptionId>,
    closed: bool,
}

pub(crate) struct RegistryParts {
    pub(crate) context: ViewContext,
    pub(crate) graph: Arc<dyn ResourceGraph>,
    pub(crate) relation: Arc<dyn TypeRelation>,
    pub(crate) candidates: Vec<ObserverDescriptor>,
    pub(crate) settings: RegistrySettings,
    pub(crate) reporter: Reporter,
}

impl ListenerRegistry {
    /// Start building a registry.
    pub fn builder() -> ListenerRegistryBuilder {
        ListenerRegistryBuilder::new()
    }

    /// Create a registry with default settings, logging faults through `tracing`.
    ///
    /// Delivers the initial `ContextLifetime` connects before returning.
    pub fn create(
        context: ViewContext,
        graph: Arc<dyn ResourceGraph>,
        relation: Arc<dyn TypeRelation>,
        candidates: Vec<ObserverDescriptor>,
    ) -> Self {
        Self::start(RegistryParts {
            context,
            graph,
            relation,
            candidates,
            settings: RegistrySettings::default(),
            reporter: Reporter::new(Arc::new(super::TracingFaultSink)),
        })
    }

    pub(crate) fn start(parts: RegistryParts) -> Self {
        let RegistryParts {
            context,
            graph,
            relation,
            candidates,
            settings,
            reporter,
        } = parts;

        let total = candidates.len();
        let observers: Vec<ObserverSlot> = candidates
            .into_iter()
            .filter(|candidate| candidate.roles().admits(&context.roles))
            .map(ObserverSlot::new)
            .collect();

        tracing::debug!(
            context = %context.id,
            roles = %context.roles,
            candidates = total,
            matching = observers.len(),
            "Creating listener registry"
        );

        let inner = Arc::new(RegistryInner {
            context: Arc::new(context),
            graph,
            relation,
            settings,
            reporter,
            state: Mutex::new(RegistryState {
                observers,
                subscription: None,
                closed: false,
            }),
        });

        let notices = inner.plan_open();
        inner.deliver(notices);

        let subscription = inner
            .graph
            .subscribe(Arc::clone(&inner) as Arc<dyn GraphListener>);
        inner.state.lock().subscription = Some(subscription);

        Self { inner }
    }

    /// Disconnect every connected observer and stop listening to the graph.
    ///
    /// Each activated observer receives one `disconnected` call with reason
    /// [`ConnectionReason::ContextLifetime`] covering the resources it currently
    /// matches. Calling `close` again does nothing.
    pub fn close(&self) {
        self.inner.close();
    }

    /// The context this registry is bound to.
    pub fn context(&self) -> &ViewContext {
        &self.inner.context
    }

    /// Settings in effect.
    pub fn settings(&self) -> &RegistrySettings {
        &self.inner.settings
    }

    /// Number of observers whose role pattern admitted the context.
    pub fn observer_count(&self) -> usize {
        self.inner.state.lock().observers.len()
    }

    /// Whether the named observer's handler has been instantiated.
    pub fn is_active(&self, name: &str) -> bool {
        self.inner
            .state
            .lock()
            .observers
            .iter()
            .any(|slot| slot.descriptor.name() == name && slot.bound().is_some())
    }

    /// Names of observers with instantiated handlers, in registration order.
    pub fn active_observers(&self) -> Vec<String> {
        self.inner
            .state
            .lock()
            .observers
            .iter()
            .filter(|slot| slot.bound().is_some())
            .map(|slot| slot.descriptor.name().to_string())
            .collect()
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }
}

impl Drop for ListenerRegistry {
    fn drop(&mut self) {
        self.inner.close();
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ListenerRegistry")
            .field("context", &self.inner.context.id)
            .field("observers", &state.observers.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl GraphListener for RegistryInner {
    fn on_graph_event(&self, event: &GraphEvent) {
        let notices = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            match event {
                GraphEvent::ResourcesChanged { added, removed } => {
                    self.plan_structure_change(&mut state, added, removed)
                }
                GraphEvent::ResourceRetagged(retag) => {
                    self.plan_retags(&mut state, std::slice::from_ref(retag))
                }
                GraphEvent::ResourcesRetagged(retags) => match self.settings.retag_ordering {
                    RetagOrdering::WholeChange => {
                        self.plan_retags(&mut state, &coalesce(retags))
                    }
                    RetagOrdering::PerResource => retags
                        .iter()
                        .flat_map(|retag| self.plan_retags(&mut state, std::slice::from_ref(retag)))
                        .collect(),
                },
            }
        };

        self.deliver(notices);
    }
}

impl RegistryInner {
    fn deliver(&self, notices: Vec<Notice>) {
        deliver_all(notices, &self.context, &self.reporter, self.settings.catch_panics);
    }

    fn matches(&self, slot: &ObserverSlot, resource: &Resource) -> bool {
        slot.descriptor
            .matches(self.relation.as_ref(), &resource.content_type)
    }

    /// Initial scan: one connect per observer with everything it matches.
    fn plan_open(&self) -> Vec<Notice> {
        let mut state = self.state.lock();
        let mut notices = Vec::new();

        for index in 0..state.observers.len() {
            let slot = &state.observers[index];
            let matching = self
                .graph
                .resources_matching(&|resource: &Resource| self.matches(slot, resource));
            if let Some(notice) =
                self.plan_connect(&mut state, index, matching, ConnectionReason::ContextLifetime)
            {
                notices.push(notice);
            }
        }

        notices
    }

    fn plan_structure_change(
        &self,
        state: &mut RegistryState,
        added: &[Resource],
        removed: &[Resource],
    ) -> Vec<Notice> {
        tracing::trace!(
            context = %self.context.id,
            added = added.len(),
            removed = removed.len(),
            "Planning structure change"
        );

        let mut notices = Vec::new();

        for slot in &state.observers {
            let gone = self.matching_subset(slot, removed.iter());
            if let Some(notice) =
                self.plan_disconnect(slot, gone, ConnectionReason::GraphStructureChange)
            {
                notices.push(notice);
            }
        }

        for index in 0..state.observers.len() {
            let joined = self.matching_subset(&state.observers[index], added.iter());
            if let Some(notice) =
                self.plan_connect(state, index, joined, ConnectionReason::GraphStructureChange)
            {
                notices.push(notice);
            }
        }

        notices
    }

    /// Plan a group of retags as one change: all disconnects, then all connects.
    fn plan_retags(&self, state: &mut RegistryState, retags: &[Retag]) -> Vec<Notice> {
        tracing::trace!(
            context = %self.context.id,
            retags = retags.len(),
            "Planning retag"
        );

        let relation = self.relation.as_ref();
        let mut notices = Vec::new();

        for slot in &state.observers {
            let lost: Vec<Resource> = retags
                .iter()
                .filter(|retag| {
                    slot.descriptor.matches(relation, &retag.before)
                        && !slot.descriptor.matches(relation, &retag.after)
                })
                .map(|retag| retag.resource.clone())
                .collect();
            if let Some(notice) = self.plan_disconnect(slot, lost, ConnectionReason::RetagChange) {
                notices.push(notice);
            }
        }

        for index in 0..state.observers.len() {
            let descriptor = &state.observers[index].descriptor;
            let gained: Vec<Resource> = retags
                .iter()
                .filter(|retag| {
                    !descriptor.matches(relation, &retag.before)
                        && descriptor.matches(relation, &retag.after)
                })
                .map(|retag| retag.resource.clone())
                .collect();
            if let Some(notice) =
                self.plan_connect(state, index, gained, ConnectionReason::RetagChange)
            {
                notices.push(notice);
            }
        }

        notices
    }

    fn matching_subset<'a>(
        &self,
        slot: &ObserverSlot,
        resources: impl Iterator<Item = &'a Resource>,
    ) -> Vec<Resource> {
        resources
            .filter(|resource| self.matches(slot, resource))
            .cloned()
            .collect()
    }

    /// Only activated observers can have anything to disconnect.
    fn plan_disconnect(
        &self,
        slot: &ObserverSlot,
        resources: Vec<Resource>,
        reason: ConnectionReason,
    ) -> Option<Notice> {
        if resources.is_empty() {
            return None;
        }
        let listener = slot.bound()?;
        Some(Notice {
            observer: slot.descriptor.name().to_string(),
            listener: Arc::clone(listener),
            delivery: slot.descriptor.delivery().clone(),
            direction: Direction::Disconnect,
            reason,
            resources,
        })
    }

    /// Activates the observer on first need.
    fn plan_connect(
        &self,
        state: &mut RegistryState,
        index: usize,
        resources: Vec<Resource>,
        reason: ConnectionReason,
    ) -> Option<Notice> {
        if resources.is_empty() {
            return None;
        }
        let listener = self.ensure_active(state, index)?;
        let slot = &state.observers[index];
        Some(Notice {
            observer: slot.descriptor.name().to_string(),
            listener,
            delivery: slot.descriptor.delivery().clone(),
            direction: Direction::Connect,
            reason,
            resources,
        })
    }

    fn ensure_active(
        &self,
        state: &mut RegistryState,
        index: usize,
    ) -> Option<Arc<dyn ConnectionListener>> {
        let slot = &mut state.observers[index];
        match &slot.state {
            HandlerState::Bound(listener) => return Some(Arc::clone(listener)),
            HandlerState::Faulted => return None,
            HandlerState::Unbound => {}
        }

        let descriptor = &slot.descriptor;
        match guarded(|| descriptor.activate(), self.settings.catch_panics) {
            Ok(listener) => {
                tracing::debug!(
                    context = %self.context.id,
                    observer = %descriptor.name(),
                    "Activated observer"
                );
                slot.state = HandlerState::Bound(Arc::clone(&listener));
                let active = state
                    .observers
                    .iter()
                    .filter(|slot| slot.bound().is_some())
                    .count();
                self.reporter.activated(active);
                Some(listener)
            }
            Err(message) => {
                let fault = ObserverFault::new(descriptor.name(), FaultKind::Activation, message);
                slot.state = HandlerState::Faulted;
                self.reporter.fault(fault);
                None
            }
        }
    }

    fn close(&self) {
        let (notices, subscription) = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;

            let mut notices = Vec::new();
            for slot in &state.observers {
                if slot.bound().is_none() {
                    continue;
                }
                let current = self
                    .graph
                    .resources_matching(&|resource: &Resource| self.matches(slot, resource));
                if let Some(notice) =
                    self.plan_disconnect(slot, current, ConnectionReason::ContextLifetime)
                {
                    notices.push(notice);
                }
            }

            (notices, state.subscription.take())
        };

        tracing::debug!(
            context = %self.context.id,
            disconnects = notices.len(),
            "Closing listener registry"
        );

        self.deliver(notices);

        if let Some(id) = subscription {
            self.graph.unsubscribe(id);
        }
    }
}

/// Fold repeated retags of one resource into a single first-before to
/// last-after change, keeping first-seen order.
fn coalesce(retags: &[Retag]) -> Vec<Retag> {
    let mut merged: Vec<Retag> = Vec::with_capacity(retags.len());
    for retag in retags {
        match merged
            .iter_mut()
            .find(|existing| existing.resource.id == retag.resource.id)
        {
            Some(existing) => {
                existing.after = retag.after.clone();
                existing.resource = retag.resource.clone();
            }
            None => merged.push(retag.clone()),
        }
    }
    merged
}
