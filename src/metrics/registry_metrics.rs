//! Registry metrics tracking using OpenTelemetry.

use opentelemetry::metrics::{Counter, Gauge, Meter};

/// Metrics collector for listener deliveries.
///
/// Cloning is cheap; clones report to the same instruments.
///
/// # Examples
///
/// ```rust,no_run
/// use content_listeners::metrics::RegistryMetrics;
/// use opentelemetry::global;
///
/// let metrics = RegistryMetrics::new(global::meter("content-listeners"));
/// metrics.record_connect(2);
/// ```
#[derive(Clone)]
pub struct RegistryMetrics {
    connects: Counter<u64>,
    disconnects: Counter<u64>,
    connected_resources: Counter<u64>,
    disconnected_resources: Counter<u64>,
    activations: Counter<u64>,
    faults: Counter<u64>,
    active_observers: Gauge<i64>,
}

impl RegistryMetrics {
    /// Create a collector with instruments registered on `meter`.
    pub fn new(meter: Meter) -> Self {
        let connects = meter
            .u64_counter("content_listeners.connects")
            .with_description("Number of connected callbacks delivered")
            .build();

        let disconnects = meter
            .u64_counter("content_listeners.disconnects")
            .with_description("Number of disconnected callbacks delivered")
            .build();

        let connected_resources = meter
            .u64_counter("content_listeners.connects.resources")
            .with_description("Resources carried by connected callbacks")
            .build();

        let disconnected_resources = meter
            .u64_counter("content_listeners.disconnects.resources")
            .with_description("Resources carried by disconnected callbacks")
            .build();

        let activations = meter
            .u64_counter("content_listeners.activations")
            .with_description("Number of observer handlers instantiated")
            .build();

        let faults = meter
            .u64_counter("content_listeners.faults")
            .with_description("Number of observer faults reported")
            .build();

        let active_observers = meter
            .i64_gauge("content_listeners.observers.active")
            .with_description("Observers with an instantiated handler in the last registry that changed")
            .build();

        Self {
            connects,
            disconnects,
            connected_resources,
            disconnected_resources,
            activations,
            faults,
            active_observers,
        }
    }

    /// Record a successful `connected` delivery.
    pub fn record_connect(&self, resources: usize) {
        self.connects.add(1, &[]);
        self.connected_resources.add(resources as u64, &[]);
    }

    /// Record a successful `disconnected` delivery.
    pub fn record_disconnect(&self, resources: usize) {
        self.disconnects.add(1, &[]);
        self.disconnected_resources.add(resources as u64, &[]);
    }

    /// Record a handler activation and the registry's new active count.
    pub fn record_activation(&self, active: usize) {
        self.activations.add(1, &[]);
        self.active_observers.record(active as i64, &[]);
    }

    /// Record an observer fault.
    pub fn record_fault(&self) {
        self.faults.add(1, &[]);
    }
}

impl std::fmt::Debug for RegistryMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryMetrics").finish_non_exhaustive()
    }
}
