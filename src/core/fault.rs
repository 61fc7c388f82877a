//! Diagnostic sinks for observer faults.

use crate::error::ObserverFault;
use parking_lot::Mutex;

/// Receives faults raised by observers.
///
/// A single sink is typically shared by every registry of a host.
pub trait FaultSink: Send + Sync {
    /// Record one fault. Must not panic.
    fn report(&self, fault: &ObserverFault);
}

/// Logs faults through `tracing` at error level. This is the default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFaultSink;

impl FaultSink for TracingFaultSink {
    fn report(&self, fault: &ObserverFault) {
        tracing::error!(
            observer = %fault.observer,
            kind = %fault.kind,
            "Observer fault: {}",
            fault.message
        );
    }
}

/// Keeps faults in memory so hosts can surface them later.
#[derive(Debug, Default)]
pub struct CollectingFaultSink {
    faults: Mutex<Vec<ObserverFault>>,
}

impl CollectingFaultSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Faults collected so far.
    pub fn faults(&self) -> Vec<ObserverFault> {
        self.faults.lock().clone()
    }

    /// Remove and return the collected faults.
    pub fn take(&self) -> Vec<ObserverFault> {
        std::mem::take(&mut *self.faults.lock())
    }

    /// Number of collected faults.
    pub fn len(&self) -> usize {
        self.faults.lock().len()
    }

    /// Whether nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FaultSink for CollectingFaultSink {
    fn report(&self, fault: &ObserverFault) {
        tracing::warn!(observer = %fault.observer, kind = %fault.kind, "{}", fault.message);
        self.faults.lock().push(fault.clone());
    }
}
