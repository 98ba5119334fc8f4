//! Per-run state owned by the engine.

use super::error::WorkflowError;
use crate::core::{Payload, RunHistory, RunId, State, StateName, TransitionRecord};
use crate::handler::WorkflowContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of one run.
///
/// `Completed` and `Aborted` are final: once reached, the run accepts no
/// further status changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Aborted(WorkflowError),
}

impl State for RunStatus {
    fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Aborted(_) => "Aborted",
        }
    }

    fn is_final(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted(_))
    }

    fn is_error(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

impl RunStatus {
    /// Whether the status machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: &RunStatus) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Aborted(_))
        )
    }

    pub fn error(&self) -> Option<&WorkflowError> {
        match self {
            Self::Aborted(err) => Some(err),
            _ => None,
        }
    }
}

/// Shared flag used to cancel a run between steps.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-run overrides for [`WorkflowEngine::start_with`](super::WorkflowEngine::start_with).
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub run_id: Option<RunId>,
    pub deadline: Option<DateTime<Utc>>,
    pub cancel: Option<CancelToken>,
    pub max_steps: Option<usize>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a caller-chosen id. The run aborts if the log already holds
    /// records for it.
    pub fn run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the deadline relative to now.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|timeout| Utc::now().checked_add_signed(timeout));
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Override the engine's step bound. Checked when the run starts.
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}

/// A run in progress.
///
/// Created by the engine when a run starts and consumed into a
/// [`RunResult`] once it is final.
#[derive(Clone, Debug)]
pub struct WorkflowRun<P: Payload> {
    id: RunId,
    initial_state: StateName,
    current_state: StateName,
    step_count: u64,
    history: RunHistory<P>,
    status: RunStatus,
    payload: P,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl<P: Payload> WorkflowRun<P> {
    pub(crate) fn new(id: RunId, initial_state: StateName, payload: P) -> Self {
        Self {
            id,
            current_state: initial_state.clone(),
            initial_state,
            step_count: 0,
            history: RunHistory::new(),
            status: RunStatus::Idle,
            payload,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn initial_state(&self) -> &StateName {
        &self.initial_state
    }

    pub fn current_state(&self) -> &StateName {
        &self.current_state
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn history(&self) -> &RunHistory<P> {
        &self.history
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Context for handlers resolved at the current step (pure)
    pub fn context(&self) -> WorkflowContext {
        WorkflowContext {
            run_id: self.id,
            initial_state: self.initial_state.clone(),
            current_state: self.current_state.clone(),
            step: self.step_count,
            started_at: self.started_at,
        }
    }

    /// Move the status machine. Returns `false` if the move is not allowed.
    pub(crate) fn set_status(&mut self, next: RunStatus) -> bool {
        if !self.status.can_transition_to(&next) {
            return false;
        }
        if next.is_final() {
            self.finished_at = Some(Utc::now());
        }
        self.status = next;
        true
    }

    /// Append a recorded transition and move to its target state.
    pub(crate) fn advance(&mut self, record: TransitionRecord<P>) {
        self.current_state = record.to.clone();
        self.step_count += 1;
        self.history.push(record);
    }

    pub(crate) fn into_result(self) -> RunResult<P> {
        RunResult {
            run_id: self.id,
            initial_state: self.initial_state,
            final_state: self.current_state,
            status: self.status,
            history: self.history,
            payload: self.payload,
            started_at: self.started_at,
            finished_at: self.finished_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Outcome of a finished run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RunResult<P: Payload> {
    pub run_id: RunId,
    pub initial_state: StateName,
    /// The state the run stopped in
    pub final_state: StateName,
    pub status: RunStatus,
    pub history: RunHistory<P>,
    pub payload: P,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl<P: Payload> RunResult<P> {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.status, RunStatus::Aborted(_))
    }

    pub fn error(&self) -> Option<&WorkflowError> {
        self.status.error()
    }

    /// Number of recorded transitions.
    pub fn steps(&self) -> usize {
        self.history.len()
    }
}
