//! Observers, their handlers and per-observer activation state.

use super::Delivery;
use crate::content::{ContentType, RoleSet, TypeRelation};
use crate::error::ListenerError;
use crate::graph::{Resource, ViewContext};
use std::fmt;
use std::sync::Arc;

/// Why a connect or disconnect is being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionReason {
    /// The context was opened or closed.
    ContextLifetime,
    /// Resources joined or left the graph.
    GraphStructureChange,
    /// A resource's content type changed.
    RetagChange,
}

impl fmt::Display for ConnectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextLifetime => write!(f, "context-lifetime"),
            Self::GraphStructureChange => write!(f, "graph-structure-change"),
            Self::RetagChange => write!(f, "retag-change"),
        }
    }
}

/// The handler behind an observer, instantiated on first use.
///
/// Both callbacks run synchronously on the thread delivering the graph change
/// (or on the dispatcher's thread for [`Delivery::Marshaled`]). Returning an
/// error reports a fault; it never stops delivery to other observers.
pub trait ConnectionListener: Send + Sync {
    /// `resources` started matching this observer in `context`.
    fn connected(
        &self,
        context: &ViewContext,
        reason: ConnectionReason,
        resources: &[Resource],
    ) -> Result<(), ListenerError>;

    /// `resources` stopped matching this observer in `context`.
    fn disconnected(
        &self,
        context: &ViewContext,
        reason: ConnectionReason,
        resources: &[Resource],
    ) -> Result<(), ListenerError>;
}

type Activator = Arc<dyn Fn() -> Result<Arc<dyn ConnectionListener>, ListenerError> + Send + Sync>;

/// A candidate observer: what it matches and how to instantiate its handler.
///
/// # Examples
///
/// ```rust
/// use content_listeners::core::{ConnectionListener, ConnectionReason, ObserverDescriptor};
/// use content_listeners::error::ListenerError;
/// use content_listeners::graph::{Resource, ViewContext};
///
/// struct Outliner;
///
/// impl ConnectionListener for Outliner {
///     fn connected(&self, _: &ViewContext, _: ConnectionReason, _: &[Resource]) -> Result<(), ListenerError> {
///         Ok(())
///     }
///
///     fn disconnected(&self, _: &ViewContext, _: ConnectionReason, _: &[Resource]) -> Result<(), ListenerError> {
///         Ok(())
///     }
/// }
///
/// let observer = ObserverDescriptor::new("outliner", || Ok(Outliner))
///     .with_content_type("code")
///     .with_role("editable");
/// assert_eq!(observer.name(), "outliner");
/// ```
#[derive(Clone)]
pub struct ObserverDescriptor {
    name: String,
    content_types: Vec<ContentType>,
    roles: RoleSet,
    delivery: Delivery,
    activator: Activator,
}

impl ObserverDescriptor {
    /// Describe an observer whose handler is built by `activate` on first need.
    ///
    /// `activate` runs while the registry holds its internal lock. It may read
    /// the resource graph but must not mutate it: the resulting change
    /// notification would re-enter the registry and deadlock.
    pub fn new<F, L>(name: impl Into<String>, activate: F) -> Self
    where
        F: Fn() -> Result<L, ListenerError> + Send + Sync + 'static,
        L: ConnectionListener + 'static,
    {
        Self::with_activator(
            name,
            Arc::new(move || activate().map(|listener| Arc::new(listener) as Arc<dyn ConnectionListener>)),
        )
    }

    /// Describe an observer around an existing handler.
    ///
    /// The handler is still only considered activated once a connect is delivered.
    pub fn from_listener<L>(name: impl Into<String>, listener: Arc<L>) -> Self
    where
        L: ConnectionListener + 'static,
    {
        Self::with_activator(
            name,
            Arc::new(move || Ok(Arc::clone(&listener) as Arc<dyn ConnectionListener>)),
        )
    }

    fn with_activator(name: impl Into<String>, activator: Activator) -> Self {
        Self {
            name: name.into(),
            content_types: Vec::new(),
            roles: RoleSet::new(),
            delivery: Delivery::Direct,
            activator,
        }
    }

    /// Add a content-type pattern.
    pub fn with_content_type(mut self, pattern: impl Into<ContentType>) -> Self {
        self.content_types.push(pattern.into());
        self
    }

    /// Add several content-type patterns.
    pub fn with_content_types<I, C>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ContentType>,
    {
        self.content_types.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Require a view role. With no roles the observer applies to every view.
    pub fn with_role(mut self, role: impl AsRef<str>) -> Self {
        self.roles.insert(role);
        self
    }

    /// Require any of several view roles.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for role in roles {
            self.roles.insert(role);
        }
        self
    }

    /// Choose how callbacks reach the handler.
    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Observer name, used in logs and faults.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared content-type patterns.
    pub fn content_types(&self) -> &[ContentType] {
        &self.content_types
    }

    /// Declared role pattern.
    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    /// Delivery mode.
    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Whether any declared pattern is a supertype of `tag`.
    pub fn matches(&self, relation: &dyn TypeRelation, tag: &ContentType) -> bool {
        self.content_types
            .iter()
            .any(|pattern| relation.is_of_type(tag, pattern))
    }

    pub(crate) fn activate(&self) -> Result<Arc<dyn ConnectionListener>, ListenerError> {
        (self.activator)()
    }
}

impl fmt::Debug for ObserverDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverDescriptor")
            .field("name", &self.name)
            .field("content_types", &self.content_types)
            .field("roles", &self.roles)
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}

/// Activation state of one observer within a registry.
pub(crate) enum HandlerState {
    /// No connect has been delivered yet.
    Unbound,
    /// Handler instantiated and reused for the registry's lifetime.
    Bound(Arc<dyn ConnectionListener>),
    /// Activation failed; the observer is skipped from now on.
    Faulted,
}

pub(crate) struct ObserverSlot {
    pub(crate) descriptor: ObserverDescriptor,
    pub(crate) state: HandlerState,
}

impl ObserverSlot {
    pub(crate) fn new(descriptor: ObserverDescriptor) -> Self {
        Self {
            descriptor,
            state: HandlerState::Unbound,
        }
    }

    pub(crate) fn bound(&self) -> Option<&Arc<dyn ConnectionListener>> {
        match &self.state {
            HandlerState::Bound(listener) => Some(listener),
            HandlerState::Unbound | HandlerState::Faulted => None,
        }
    }

    pub(crate) fn is_faulted(&self) -> bool {
        matches!(self.state, HandlerState::Faulted)
    }
}
