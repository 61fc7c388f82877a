//! Error types for content-listeners.

use std::fmt;

/// Result type alias for content-listeners operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Error type returned by listener callbacks and activation functions.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when building a registry or loading its settings.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A required collaborator was not supplied to the builder.
    #[error("Missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Failed to load settings from a source.
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    /// Failed to deserialize settings.
    #[error("Failed to deserialize settings: {0}")]
    DeserializationError(String),
}

/// The callback or step during which an observer faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The observer's handler could not be instantiated.
    Activation,
    /// The handler's `connected` callback failed.
    Connected,
    /// The handler's `disconnected` callback failed.
    Disconnected,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activation => write!(f, "activation"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// A failure raised by one observer.
///
/// Faults are reported to a [`FaultSink`](crate::core::FaultSink) and never
/// propagated to whoever triggered the notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Observer '{observer}' faulted during {kind}: {message}")]
pub struct ObserverFault {
    /// Name of the observer that faulted
    pub observer: String,
    /// Where the fault happened
    pub kind: FaultKind,
    /// Error or panic message
    pub message: String,
}

impl ObserverFault {
    /// Create a new observer fault.
    pub fn new(observer: impl Into<String>, kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            observer: observer.into(),
            kind,
            message: message.into(),
        }
    }
}
