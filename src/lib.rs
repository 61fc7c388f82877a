//! # content-listeners
//!
//! Content-type driven connect/disconnect notifications for editor views.
//!
//! ## Overview
//!
//! An editor view shows a graph of resources (text buffers) that gains, loses
//! and retags members over time. Plugins care about some content types only.
//! `content-listeners` binds one [`ListenerRegistry`](core::ListenerRegistry)
//! to each view and tells every interested plugin exactly when resources start
//! and stop matching it:
//! - Observers declare content-type patterns and view roles
//! - Handlers are instantiated lazily, on the first connect they receive
//! - Connects and disconnects strictly alternate per (observer, resource)
//! - A failing observer never blocks delivery to the others
//!
//! ## Quick Start
//!
//! ```rust
//! use content_listeners::prelude::*;
//! use std::sync::Arc;
//!
//! struct Linter;
//!
//! impl ConnectionListener for Linter {
//!     fn connected(&self, view: &ViewContext, reason: ConnectionReason, buffers: &[Resource]) -> Result<(), ListenerError> {
//!         println!("{}: linting {} buffer(s) ({})", view.id, buffers.len(), reason);
//!         Ok(())
//!     }
//!
//!     fn disconnected(&self, view: &ViewContext, reason: ConnectionReason, buffers: &[Resource]) -> Result<(), ListenerError> {
//!         println!("{}: dropping {} buffer(s) ({})", view.id, buffers.len(), reason);
//!         Ok(())
//!     }
//! }
//!
//! # fn example() -> content_listeners::error::Result<()> {
//! let graph = Arc::new(MemoryGraph::new());
//! let types = Arc::new(ContentTypeRegistry::new().with_bases("code", ["text"]));
//!
//! let registry = ListenerRegistry::builder()
//!     .with_context(ViewContext::new(1, RoleSet::new().with("editable")))
//!     .with_graph(graph.clone())
//!     .with_type_relation(types)
//!     .with_observer(
//!         ObserverDescriptor::new("linter", || Ok(Linter))
//!             .with_content_type("code")
//!             .with_role("editable"),
//!     )
//!     .build()?;
//!
//! let buffer = graph.insert("text/plain"); // linter stays dormant
//! graph.retag(buffer.id, "code/rust");     // linter activated and connected
//! registry.close();                        // linter disconnected
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `yaml`, `toml`, `json` (all on by default): settings file formats
//! - `metrics`: OpenTelemetry delivery metrics

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod content;
pub mod core;
pub mod error;
pub mod graph;
pub mod settings;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::content::{ContentType, ContentTypeRegistry, PathRelation, RoleSet, TypeRelation};
    pub use crate::core::{
        CollectingFaultSink, ConnectionListener, ConnectionReason, Delivery, Dispatcher,
        FaultSink, ListenerRegistry, ListenerRegistryBuilder, ObserverDescriptor,
        TracingFaultSink,
    };
    pub use crate::error::{ListenerError, ObserverFault, RegistryError};
    pub use crate::graph::{
        GraphEvent, MemoryGraph, Resource, ResourceGraph, ResourceId, ViewContext,
    };
    pub use crate::settings::{RegistrySettings, RetagOrdering};
}
