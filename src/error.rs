use thiserror::Error;
use tracing::error;

/// Structured failure kinds surfaced across the crate (spec §4.7).
///
/// Propagation is strict and local: a decode error in one column does not
/// poison the others, and `Reader::validate` aggregates rather than
/// short-circuits on the first failure.
#[derive(Debug, Error)]
pub enum JonxError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("file error: {0}")]
    File(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JonxError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn file(msg: impl Into<String>) -> Self {
        Self::File(msg.into())
    }

    /// Mirrors the donor's `QueryExecutionError::log_error`: emit a
    /// structured `tracing` event for an error that is about to cross back
    /// out to a caller who may not log it themselves.
    pub fn log(self) -> Self {
        match &self {
            JonxError::Validation(m) => error!(target: "jonx::error", kind = "validation", %m),
            JonxError::Decode(m) => error!(target: "jonx::error", kind = "decode", %m),
            JonxError::Encode(m) => error!(target: "jonx::error", kind = "encode", %m),
            JonxError::File(m) => error!(target: "jonx::error", kind = "file", %m),
            JonxError::Io(e) => error!(target: "jonx::error", kind = "io", error = %e),
        }
        self
    }
}

pub type JonxResult<T> = Result<T, JonxError>;
