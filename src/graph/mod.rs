//! Resource graphs observed by the registry.
//!
//! The host owns the graph; the registry only queries snapshots and listens
//! for [`GraphEvent`]s.

mod context;
mod memory;
mod resource;

pub use context::{ContextId, ViewContext};
pub use memory::MemoryGraph;
pub use resource::{
    GraphEvent, GraphListener, Resource, ResourceGraph, ResourceId, Retag, SubscriptionId,
};
