//! Reasons a workflow run aborts.

use crate::core::RunId;
use crate::log::LogError;
use crate::registry::RegistryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a single run.
///
/// None of them affect the registry or the log; both stay usable for
/// later runs. Nothing is retried inside the engine.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum WorkflowError {
    /// A state name had no registered handler
    #[error("Unknown state '{name}'")]
    UnknownState { name: String },

    /// A transition could not be durably recorded
    #[error("Transition log write failed: {message}")]
    LogWrite { message: String },

    /// Existing records could not be read back
    #[error("Transition log read failed: {message}")]
    LogRead { message: String },

    /// A caller-supplied run id already has records in the log
    #[error("Run id {run_id} already has recorded transitions")]
    RunIdInUse { run_id: RunId },

    /// The run's step bound is outside `1..=ceiling`
    #[error("Step bound {max_steps} is outside 1..={ceiling}")]
    InvalidStepBound { max_steps: usize, ceiling: usize },

    /// The run recorded its maximum number of transitions
    #[error("Cycle limit of {max_steps} transitions exceeded")]
    CycleLimitExceeded { max_steps: usize },

    /// The run's deadline passed before it finished
    #[error("Deadline {deadline} exceeded")]
    DeadlineExceeded { deadline: DateTime<Utc> },

    /// The run was cancelled between steps
    #[error("Run cancelled")]
    Cancelled,
}

impl From<RegistryError> for WorkflowError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownState { name } => Self::UnknownState { name },
        }
    }
}

impl From<LogError> for WorkflowError {
    fn from(err: LogError) -> Self {
        let message = err.to_string();
        match err {
            LogError::Read { .. } | LogError::Corrupt { .. } => Self::LogRead { message },
            LogError::Open { .. } | LogError::Write { .. } => Self::LogWrite { message },
        }
    }
}
