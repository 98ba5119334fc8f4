//! Checkpoint and resume for workflow runs.
//!
//! A checkpoint captures a finished run so that the caller can later start a
//! fresh run from where it stopped, e.g. after raising `max_steps` or
//! registering a missing state. Handlers are not part of a checkpoint; they
//! come from the registry of the engine that resumes it.

use crate::core::{Payload, RunHistory, RunId, State, StateName};
use crate::engine::{RunResult, RunStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a finished run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RunCheckpoint<P: Payload> {
    /// Checkpoint format version
    pub version: u32,

    /// Run the checkpoint was taken from
    pub run_id: RunId,

    /// When checkpoint was created
    pub created_at: DateTime<Utc>,

    /// State the run started in
    pub initial_state: StateName,

    /// State a resumed run starts in
    pub resume_state: StateName,

    /// Status the run finished with
    pub status: RunStatus,

    /// Complete transition history
    pub history: RunHistory<P>,

    /// The run's work item
    pub payload: P,
}

impl<P: Payload> RunCheckpoint<P> {
    /// Capture a run result.
    pub fn from_result(result: &RunResult<P>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            run_id: result.run_id,
            created_at: Utc::now(),
            initial_state: result.initial_state.clone(),
            resume_state: result.final_state.clone(),
            status: result.status.clone(),
            history: result.history.clone(),
            payload: result.payload.clone(),
        }
    }

    /// Completed runs have nothing left to do.
    pub fn is_resumable(&self) -> bool {
        self.status.is_error()
    }

    /// Check version and history consistency.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        self.history.verify(&self.initial_state)?;

        if let Some(record) = self.history.records().iter().find(|r| r.run_id != self.run_id) {
            return Err(CheckpointError::ValidationFailed(format!(
                "record {} belongs to run {}, checkpoint is for {}",
                record.sequence, record.run_id, self.run_id
            )));
        }

        let expected = self
            .history
            .last()
            .map(|r| &r.to)
            .unwrap_or(&self.initial_state);
        if &self.resume_state != expected {
            return Err(CheckpointError::ValidationFailed(format!(
                "resume state '{}' does not follow history ending at '{}'",
                self.resume_state, expected
            )));
        }

        Ok(())
    }

    /// Encode as pretty JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Decode and validate a JSON checkpoint.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    /// Encode in compact binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Decode and validate a binary checkpoint.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }
}

impl<P: Payload> RunResult<P> {
    /// Snapshot this result for a later [`resume`](crate::engine::WorkflowEngine::resume).
    pub fn checkpoint(&self) -> RunCheckpoint<P> {
        RunCheckpoint::from_result(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TransitionRecord;
    use crate::engine::WorkflowError;
    use uuid::Uuid;

    fn aborted_checkpoint() -> RunCheckpoint<String> {
        let run_id = Uuid::new_v4();
        let history = RunHistory::new()
            .record(TransitionRecord {
                run_id,
                sequence: 0,
                from: StateName::from("Producer"),
                to: StateName::from("Retailer"),
                payload: "widget".to_string(),
                timestamp: Utc::now(),
            })
            .record(TransitionRecord {
                run_id,
                sequence: 1,
                from: StateName::from("Retailer"),
                to: StateName::from("Consumer"),
                payload: "widget".to_string(),
                timestamp: Utc::now(),
            });

        RunCheckpoint {
            version: CHECKPOINT_VERSION,
            run_id,
            created_at: Utc::now(),
            initial_state: StateName::from("Producer"),
            resume_state: StateName::from("Consumer"),
            status: RunStatus::Aborted(WorkflowError::CycleLimitExceeded { max_steps: 2 }),
            history,
            payload: "widget".to_string(),
        }
    }

    #[test]
    fn json_roundtrip_preserves_checkpoint() {
        let checkpoint = aborted_checkpoint();
        let json = checkpoint.to_json().unwrap();
        assert_eq!(RunCheckpoint::from_json(&json).unwrap(), checkpoint);
    }

    #[test]
    fn binary_roundtrip_preserves_checkpoint() {
        let checkpoint = aborted_checkpoint();
        let bytes = checkpoint.to_bytes().unwrap();
        assert_eq!(RunCheckpoint::<String>::from_bytes(&bytes).unwrap(), checkpoint);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut checkpoint = aborted_checkpoint();
        checkpoint.version = 99;
        let json = checkpoint.to_json().unwrap();

        assert!(matches!(
            RunCheckpoint::<String>::from_json(&json),
            Err(CheckpointError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn resume_state_must_follow_history() {
        let mut checkpoint = aborted_checkpoint();
        checkpoint.resume_state = StateName::from("Recycler");

        assert!(matches!(
            checkpoint.validate(),
            Err(CheckpointError::ValidationFailed(_))
        ));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            RunCheckpoint::<String>::from_bytes(&[0xff, 0x01]),
            Err(CheckpointError::DeserializationFailed(_))
        ));
    }

    #[test]
    fn completed_runs_are_not_resumable() {
        let mut checkpoint = aborted_checkpoint();
        assert!(checkpoint.is_resumable());
        checkpoint.status = RunStatus::Completed;
        assert!(!checkpoint.is_resumable());
    }
}
