//! Fault-isolated delivery of connect/disconnect callbacks.

use super::{ConnectionListener, ConnectionReason, FaultSink};
use crate::error::{FaultKind, ListenerError, ObserverFault};
use crate::graph::{Resource, ViewContext};
use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::RegistryMetrics;

/// A unit of work handed to a [`Dispatcher`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs on a thread of the host's choosing, typically its UI thread.
///
/// Jobs must run in the order they were dispatched.
pub trait Dispatcher: Send + Sync {
    /// Queue `job` for execution.
    fn dispatch(&self, job: Job);
}

/// How callbacks reach an observer's handler.
///
/// Within one change all disconnects are issued before any connect, but that
/// order only holds per thread. With mixed modes a `Direct` connect runs
/// immediately, possibly before a `Marshaled` disconnect of the same change
/// has left the dispatcher's queue. Per-observer alternation is unaffected.
#[derive(Clone, Default)]
pub enum Delivery {
    /// Call the handler on the thread that delivered the graph change.
    #[default]
    Direct,
    /// Hand each callback to a dispatcher.
    Marshaled(Arc<dyn Dispatcher>),
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "Direct"),
            Self::Marshaled(_) => write!(f, "Marshaled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Connect,
    Disconnect,
}

impl Direction {
    fn fault_kind(self) -> FaultKind {
        match self {
            Self::Connect => FaultKind::Connected,
            Self::Disconnect => FaultKind::Disconnected,
        }
    }
}

/// Where faults go, plus optional delivery counters.
#[derive(Clone)]
pub(crate) struct Reporter {
    sink: Arc<dyn FaultSink>,
    #[cfg(feature = "metrics")]
    metrics: Option<RegistryMetrics>,
}

impl Reporter {
    pub(crate) fn new(sink: Arc<dyn FaultSink>) -> Self {
        Self {
            sink,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: Option<RegistryMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub(crate) fn fault(&self, fault: ObserverFault) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_fault();
        }
        self.sink.report(&fault);
    }

    #[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
    pub(crate) fn activated(&self, active: usize) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_activation(active);
        }
    }

    #[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
    fn delivered(&self, direction: Direction, resources: usize) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            match direction {
                Direction::Connect => metrics.record_connect(resources),
                Direction::Disconnect => metrics.record_disconnect(resources),
            }
        }
    }
}

/// One planned callback.
pub(crate) struct Notice {
    pub(crate) observer: String,
    pub(crate) listener: Arc<dyn ConnectionListener>,
    pub(crate) delivery: Delivery,
    pub(crate) direction: Direction,
    pub(crate) reason: ConnectionReason,
    pub(crate) resources: Vec<Resource>,
}

/// Deliver planned callbacks in order.
pub(crate) fn deliver_all(
    notices: Vec<Notice>,
    context: &Arc<ViewContext>,
    reporter: &Reporter,
    catch_panics: bool,
) {
    for notice in notices {
        match notice.delivery.clone() {
            Delivery::Direct => invoke(notice, context, reporter, catch_panics),
            Delivery::Marshaled(dispatcher) => {
                let context = Arc::clone(context);
                let reporter = reporter.clone();
                dispatcher.dispatch(Box::new(move || {
                    invoke(notice, &context, &reporter, catch_panics)
                }));
            }
        }
    }
}

fn invoke(notice: Notice, context: &ViewContext, reporter: &Reporter, catch_panics: bool) {
    tracing::debug!(
        observer = %notice.observer,
        direction = ?notice.direction,
        reason = %notice.reason,
        resources = notice.resources.len(),
        "Delivering connection notice"
    );

    let call = || match notice.direction {
        Direction::Connect => notice
            .listener
            .connected(context, notice.reason, &notice.resources),
        Direction::Disconnect => notice
            .listener
            .disconnected(context, notice.reason, &notice.resources),
    };

    match guarded(call, catch_panics) {
        Ok(()) => reporter.delivered(notice.direction, notice.resources.len()),
        Err(message) => reporter.fault(ObserverFault::new(
            notice.observer.as_str(),
            notice.direction.fault_kind(),
            message,
        )),
    }
}

/// Run `f`, turning an error (and a panic, when enabled) into a message.
pub(crate) fn guarded<T>(
    f: impl FnOnce() -> Result<T, ListenerError>,
    catch_panics: bool,
) -> Result<T, String> {
    if !catch_panics {
        return f().map_err(|e| e.to_string());
    }

    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
