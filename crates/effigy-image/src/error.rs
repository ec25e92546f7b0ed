use effigy_engine::EngineError;
use thiserror::Error;

/// An error type for the managed image layer.
#[derive(Debug, Error)]
pub enum ImageError {
    /// A local precondition failed; no engine call was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A settings value was rejected before being applied; the previously
    /// cached value is unchanged.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A batch operation needs more images than the collection holds.
    #[error("operation requires at least {required} image(s), the collection holds {actual}")]
    InsufficientInput {
        /// Minimum number of images the operation needs.
        required: usize,
        /// Number of images the collection actually holds.
        actual: usize,
    },

    /// Reading an input source failed.
    #[error("failed to read the input source: {0}")]
    Io(#[from] std::io::Error),

    /// The engine reported a failure.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
