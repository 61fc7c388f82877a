//! Builder for constructing ListenerRegistry instances.

use super::delivery::Reporter;
use super::registry::RegistryParts;
use super::{FaultSink, ListenerRegistry, ObserverDescriptor, TracingFaultSink};
use crate::content::TypeRelation;
use crate::error::{RegistryError, Result};
use crate::graph::{ResourceGraph, ViewContext};
use crate::settings::RegistrySettings;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::RegistryMetrics;

/// Builder for a [`ListenerRegistry`].
///
/// The view context, the resource graph and the type relation are required;
/// everything else has a default.
///
/// # Examples
///
/// ```rust
/// use content_listeners::prelude::*;
/// use std::sync::Arc;
///
/// # fn example() -> content_listeners::error::Result<()> {
/// let sink = Arc::new(CollectingFaultSink::new());
///
/// let registry = ListenerRegistry::builder()
///     .with_context(ViewContext::new(7, RoleSet::new().with("editable")))
///     .with_graph(Arc::new(MemoryGraph::new()))
///     .with_type_relation(Arc::new(ContentTypeRegistry::new()))
///     .with_fault_sink(sink.clone())
///     .with_settings(RegistrySettings::default().with_retag_ordering(RetagOrdering::PerResource))
///     .build()?;
///
/// assert_eq!(registry.observer_count(), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ListenerRegistryBuilder {
    context: Option<ViewContext>,
    graph: Option<Arc<dyn ResourceGraph>>,
    relation: Option<Arc<dyn TypeRelation>>,
    observers: Vec<ObserverDescriptor>,
    fault_sink: Option<Arc<dyn FaultSink>>,
    settings: RegistrySettings,
    #[cfg(feature = "metrics")]
    metrics: Option<RegistryMetrics>,
}

impl ListenerRegistryBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// The view the registry is bound to.
    pub fn with_context(mut self, context: ViewContext) -> Self {
        self.context = Some(context);
        self
    }

    /// The view's resource graph.
    pub fn with_graph(mut self, graph: Arc<dyn ResourceGraph>) -> Self {
        self.graph = Some(graph);
        self
    }

    /// The host's content-type subtype relation.
    pub fn with_type_relation(mut self, relation: Arc<dyn TypeRelation>) -> Self {
        self.relation = Some(relation);
        self
    }

    /// Add one candidate observer.
    pub fn with_observer(mut self, observer: ObserverDescriptor) -> Self {
        self.observers.push(observer);
        self
    }

    /// Add several candidate observers, keeping their order.
    pub fn with_observers(mut self, observers: impl IntoIterator<Item = ObserverDescriptor>) -> Self {
        self.observers.extend(observers);
        self
    }

    /// Where observer faults are reported. Defaults to [`TracingFaultSink`].
    pub fn with_fault_sink(mut self, sink: Arc<dyn FaultSink>) -> Self {
        self.fault_sink = Some(sink);
        self
    }

    /// Registry settings.
    pub fn with_settings(mut self, settings: RegistrySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Record delivery metrics on `meter`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(RegistryMetrics::new(meter));
        self
    }

    /// Build the registry and deliver the initial connects.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingCollaborator`] if the context, graph or
    /// type relation was not supplied.
    pub fn build(self) -> Result<ListenerRegistry> {
        let context = self
            .context
            .ok_or(RegistryError::MissingCollaborator("view context"))?;
        let graph = self
            .graph
            .ok_or(RegistryError::MissingCollaborator("resource graph"))?;
        let relation = self
            .relation
            .ok_or(RegistryError::MissingCollaborator("type relation"))?;

        let sink = self
            .fault_sink
            .unwrap_or_else(|| Arc::new(TracingFaultSink) as Arc<dyn FaultSink>);
        let reporter = Reporter::new(sink);
        #[cfg(feature = "metrics")]
        let reporter = reporter.with_metrics(self.metrics);

        Ok(ListenerRegistry::start(RegistryParts {
            context,
            graph,
            relation,
            candidates: self.observers,
            settings: self.settings,
            reporter,
        }))
    }
}
