use thiserror::Error;

use crate::handle::RasterId;

/// An error type for engine boundary operations.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// The engine reported an unrecoverable condition. The message is the
    /// engine's diagnostic text, verbatim; the resource the call ran against
    /// should be considered indeterminate for further mutating calls.
    #[error("native operation failed: {message}")]
    Native {
        /// Diagnostic text reported by the engine.
        message: String,
    },

    /// The wrapper no longer owns a native resource.
    #[error("native resource was already released")]
    Disposed,

    /// The engine does not know the given handle.
    #[error("unknown raster handle {0}")]
    UnknownHandle(RasterId),

    /// A progress observer requested cancellation and the engine stopped
    /// cooperatively.
    #[error("operation cancelled by a progress observer")]
    Cancelled,

    /// The engine broke the call contract, e.g. a chain operation returned a
    /// result shape the operation cannot produce.
    #[error("engine contract violation: {0}")]
    Contract(String),
}

impl EngineError {
    /// Wraps an engine diagnostic as a fatal error.
    pub fn native(message: impl Into<String>) -> Self {
        Self::Native {
            message: message.into(),
        }
    }
}
