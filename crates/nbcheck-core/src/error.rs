//! Error types for nbcheck-core.

use thiserror::Error;

/// Result type for nbcheck-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure errors that abort an operation.
///
/// Expected outcomes are not represented here: a dirty cell is a
/// `Violation`, a cell that raised or timed out is a `CellFailure` inside
/// the run's `ExecutionReport`. Those travel as data so callers can tell
/// "the notebook has a bug" apart from "the tool itself could not run".
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to parse or serialize a notebook document.
    #[error("notebook JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Notebook file name violates a naming constraint.
    #[error("invalid notebook file name: {0}")]
    Filename(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode or decode a channel message.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Communication with the kernel process broke down.
    #[error("channel error: {0}")]
    Channel(String),

    /// The kernel process could not be started or stopped cleanly.
    #[error("kernel process error: {0}")]
    Kernel(String),
}
