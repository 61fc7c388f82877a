//! Built-in metrics for listener registries.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Connect and disconnect deliveries, and the resources they carried
//! - Handler activations and the number of active observers
//! - Observer faults
//!
//! # Examples
//!
//! ```rust,no_run
//! use content_listeners::prelude::*;
//! use opentelemetry::global;
//! use std::sync::Arc;
//!
//! # fn example() -> content_listeners::error::Result<()> {
//! let registry = ListenerRegistry::builder()
//!     .with_context(ViewContext::new(1, RoleSet::new()))
//!     .with_graph(Arc::new(MemoryGraph::new()))
//!     .with_type_relation(Arc::new(PathRelation))
//!     .with_metrics(global::meter("my-editor"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod registry_metrics;

pub use registry_metrics::RegistryMetrics;
