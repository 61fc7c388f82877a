//! The listener registry and the observer model it drives.

mod builder;
mod delivery;
mod fault;
mod observer;
mod registry;

pub use builder::ListenerRegistryBuilder;
pub use delivery::{Delivery, Dispatcher, Job};
pub use fault::{CollectingFaultSink, FaultSink, TracingFaultSink};
pub use observer::{ConnectionListener, ConnectionReason, ObserverDescriptor};
pub use registry::ListenerRegistry;
