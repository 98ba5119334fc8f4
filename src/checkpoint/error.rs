//! Checkpoint error types.

use crate::core::{HistoryViolation, RunId};
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Checkpoint version is not supported by this version
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Recorded history breaks the ordering invariant
    #[error("Checkpoint history is inconsistent: {0}")]
    InvalidHistory(#[from] HistoryViolation),

    /// Checkpoint data failed validation
    #[error("Checkpoint validation failed: {0}")]
    ValidationFailed(String),

    /// The run already completed; there is nothing to resume
    #[error("Run {run_id} is not resumable (status: {status})")]
    NotResumable { run_id: RunId, status: String },
}
