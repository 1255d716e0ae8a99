use thiserror::Error;

/// Errors raised by the engine, the canvas and the codec boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid construction arguments (zero dimensions, missing buffer, bad config).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Size disagreement between buffers or masks. Raised before any write.
    #[error("dimension mismatch in {context}: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        context: &'static str,
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    /// A parallel chunk returned an error or panicked. The destination is invalid.
    #[error("worker failure in chunk {chunk} (rows {start}..{end}): {message}")]
    WorkerFailure {
        chunk: usize,
        start: usize,
        end: usize,
        message: String,
    },

    #[error("codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        EngineError::Configuration(msg.into())
    }
}
