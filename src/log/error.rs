//! Transition log error types.

use crate::core::RunId;
use thiserror::Error;

/// Errors raised by transition log sinks
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LogError {
    /// The sink could not be opened
    #[error("Failed to open transition log at {path}: {message}")]
    Open { path: String, message: String },

    /// A record could not be durably appended
    #[error("Failed to append transition for run {run_id}: {message}")]
    Write { run_id: RunId, message: String },

    /// Records could not be read back
    #[error("Failed to read transitions for run {run_id}: {message}")]
    Read { run_id: RunId, message: String },

    /// A stored record could not be decoded
    #[error("Corrupt transition record for run {run_id} at line {line}: {message}")]
    Corrupt {
        run_id: RunId,
        line: usize,
        message: String,
    },
}
