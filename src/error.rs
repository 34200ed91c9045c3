//! Error types for observer-registry.

use std::error::Error as StdError;
use std::fmt;

/// Result type alias for observer-registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur when working with a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A listener failed and the registry stopped delivering (fail-fast policy).
    #[error("Broadcast aborted")]
    ListenerFailed(#[source] ListenerFailure),

    /// One or more listeners failed during a best-effort broadcast.
    #[error("{} of {attempted} listeners failed during broadcast", .failures.len())]
    BroadcastFailed {
        /// Number of listeners the event was delivered to
        attempted: usize,
        /// Every failure, in delivery order
        failures: Vec<ListenerFailure>,
    },

    /// Failed to load registry settings from a source.
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    /// Failed to deserialize registry settings.
    #[error("Failed to deserialize settings: {0}")]
    DeserializationError(String),
}

impl RegistryError {
    /// All listener failures carried by this error.
    ///
    /// Empty for settings errors.
    pub fn failures(&self) -> &[ListenerFailure] {
        match self {
            Self::ListenerFailed(failure) => std::slice::from_ref(failure),
            Self::BroadcastFailed { failures, .. } => failures,
            Self::LoadError(_) | Self::DeserializationError(_) => &[],
        }
    }
}

/// Error returned by a listener's notification handler.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Handler failed with a message.
    #[error("{0}")]
    Message(String),

    /// Handler failed because of an underlying error.
    #[error("{message}")]
    Source {
        /// What the handler was doing
        message: String,
        /// The underlying error
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl ListenerError {
    /// Create a listener error from a message.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Create a listener error wrapping an underlying error.
    pub fn with_source(
        msg: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Source {
            message: msg.into(),
            source: source.into(),
        }
    }
}

/// A listener error tagged with the listener's position in the broadcast.
///
/// Positions are zero-based indices into the snapshot taken when the broadcast
/// started, which is registration order. `Display` names the position only;
/// the listener's own error is the [`source`](StdError::source).
#[derive(Debug)]
pub struct ListenerFailure {
    /// Zero-based position of the failing listener
    pub position: usize,
    /// The error the listener returned
    pub error: ListenerError,
}

impl ListenerFailure {
    pub(crate) fn new(position: usize, error: ListenerError) -> Self {
        Self { position, error }
    }
}

impl fmt::Display for ListenerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener #{} failed", self.position)
    }
}

impl StdError for ListenerFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}
