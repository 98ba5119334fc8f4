//! The workflow engine run loop.

use super::error::WorkflowError;
use super::run::{RunOptions, RunResult, RunStatus, WorkflowRun};
use crate::checkpoint::{CheckpointError, RunCheckpoint};
use crate::config::{ConfigError, EngineConfig, MAX_STEPS_CEILING};
use crate::core::{Payload, RunHistory, RunId, State, StateName, TransitionRecord};
use crate::handler::StateDecision;
use crate::log::{LogError, TransitionLog};
use crate::registry::StateRegistry;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Drives runs from an initial state to `Completed` or `Aborted`.
///
/// Each run executes sequentially on the calling thread: a transition is
/// durably appended before the next handler is resolved. Independent runs
/// may share one engine from many threads.
///
/// # Example
///
/// ```rust
/// use statewright::engine::WorkflowEngine;
/// use statewright::handler::{advance_to, terminal};
/// use statewright::log::MemoryTransitionLog;
/// use statewright::registry::StateRegistry;
/// use std::sync::Arc;
///
/// let registry = Arc::new(StateRegistry::<String>::new());
/// registry.register_handler("Producer", advance_to("Retailer"));
/// registry.register_handler("Retailer", terminal());
///
/// let engine = WorkflowEngine::new(registry, Arc::new(MemoryTransitionLog::<String>::new()));
/// let result = engine.start("Producer", "widget".to_string());
///
/// assert!(result.is_completed());
/// assert_eq!(result.steps(), 1);
/// ```
pub struct WorkflowEngine<P: Payload> {
    registry: Arc<StateRegistry<P>>,
    log: Arc<dyn TransitionLog<P>>,
    config: EngineConfig,
}

impl<P: Payload> WorkflowEngine<P> {
    /// Create an engine with the default configuration.
    pub fn new(registry: Arc<StateRegistry<P>>, log: Arc<dyn TransitionLog<P>>) -> Self {
        Self {
            registry,
            log,
            config: EngineConfig::default(),
        }
    }

    /// Create an engine with a validated configuration.
    pub fn with_config(
        registry: Arc<StateRegistry<P>>,
        log: Arc<dyn TransitionLog<P>>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.check()?;
        Ok(Self::from_parts(registry, log, config))
    }

    pub(crate) fn from_parts(
        registry: Arc<StateRegistry<P>>,
        log: Arc<dyn TransitionLog<P>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            log,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<StateRegistry<P>> {
        &self.registry
    }

    pub fn log(&self) -> &Arc<dyn TransitionLog<P>> {
        &self.log
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a workflow to completion with default options.
    pub fn start(&self, initial: impl Into<StateName>, payload: P) -> RunResult<P> {
        self.start_with(initial, payload, RunOptions::default())
    }

    /// Run a workflow to completion.
    ///
    /// Returns once the run is `Completed` or `Aborted`; failures are
    /// reported through the result's status, never by panicking.
    pub fn start_with(
        &self,
        initial: impl Into<StateName>,
        payload: P,
        options: RunOptions,
    ) -> RunResult<P> {
        let run_id = options.run_id.unwrap_or_else(Uuid::new_v4);
        let max_steps = options.max_steps.unwrap_or(self.config.max_steps);
        let mut run = WorkflowRun::new(run_id, initial.into(), payload);

        let deadline = options.deadline.or_else(|| {
            self.config
                .run_timeout()
                .and_then(|timeout| chrono::Duration::from_std(timeout).ok())
                .and_then(|timeout| Utc::now().checked_add_signed(timeout))
        });

        run.set_status(RunStatus::Running);
        info!(
            run_id = %run_id,
            initial_state = %run.initial_state(),
            max_steps,
            "Workflow run started"
        );

        let outcome = self
            .preflight(run_id, options.run_id.is_some(), max_steps)
            .and_then(|()| self.drive(&mut run, max_steps, deadline, &options));

        match outcome {
            Ok(()) => {
                run.set_status(RunStatus::Completed);
                info!(
                    run_id = %run_id,
                    final_state = %run.current_state(),
                    steps = run.step_count(),
                    "Workflow run completed"
                );
            }
            Err(err) => {
                warn!(
                    run_id = %run_id,
                    state = %run.current_state(),
                    steps = run.step_count(),
                    error = %err,
                    "Workflow run aborted"
                );
                run.set_status(RunStatus::Aborted(err));
            }
        }

        run.into_result()
    }

    /// Start a run on its own worker thread.
    pub fn spawn(
        self: &Arc<Self>,
        initial: impl Into<StateName>,
        payload: P,
        options: RunOptions,
    ) -> JoinHandle<RunResult<P>> {
        let engine = Arc::clone(self);
        let initial = initial.into();
        thread::spawn(move || engine.start_with(initial, payload, options))
    }

    /// Read a run's history back from the log.
    pub fn replay(&self, run_id: RunId) -> Result<RunHistory<P>, LogError> {
        self.log.read(run_id).map(RunHistory::from)
    }

    /// Start a fresh run from where a checkpointed run stopped.
    pub fn resume(
        &self,
        checkpoint: &RunCheckpoint<P>,
        options: RunOptions,
    ) -> Result<RunResult<P>, CheckpointError> {
        checkpoint.validate()?;
        if !checkpoint.is_resumable() {
            return Err(CheckpointError::NotResumable {
                run_id: checkpoint.run_id,
                status: checkpoint.status.name().to_string(),
            });
        }

        info!(
            previous_run_id = %checkpoint.run_id,
            resume_state = %checkpoint.resume_state,
            "Resuming workflow from checkpoint"
        );

        Ok(self.start_with(
            checkpoint.resume_state.clone(),
            checkpoint.payload.clone(),
            options,
        ))
    }

    /// Checks made before the first handler runs.
    fn preflight(
        &self,
        run_id: RunId,
        caller_supplied_id: bool,
        max_steps: usize,
    ) -> Result<(), WorkflowError> {
        if max_steps == 0 || max_steps > MAX_STEPS_CEILING {
            return Err(WorkflowError::InvalidStepBound {
                max_steps,
                ceiling: MAX_STEPS_CEILING,
            });
        }
        // Sequences restart at 0, so a reused id would interleave two runs.
        if caller_supplied_id && !self.log.read(run_id)?.is_empty() {
            return Err(WorkflowError::RunIdInUse { run_id });
        }
        Ok(())
    }

    /// The transition loop. `Ok` means a handler returned `Terminal`.
    fn drive(
        &self,
        run: &mut WorkflowRun<P>,
        max_steps: usize,
        deadline: Option<DateTime<Utc>>,
        options: &RunOptions,
    ) -> Result<(), WorkflowError> {
        loop {
            if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                return Err(WorkflowError::Cancelled);
            }
            if let Some(deadline) = deadline {
                if Utc::now() > deadline {
                    return Err(WorkflowError::DeadlineExceeded { deadline });
                }
            }

            let handler = self.registry.resolve(run.current_state(), &run.context())?;

            let next = match handler.process(run.payload()) {
                StateDecision::Terminal => return Ok(()),
                StateDecision::Advance(next) => next,
            };

            if run.step_count() >= max_steps as u64 {
                return Err(WorkflowError::CycleLimitExceeded { max_steps });
            }
            // The target must be resolvable at the time it is recorded.
            if !self.registry.contains(next.as_str()) {
                return Err(WorkflowError::UnknownState {
                    name: next.to_string(),
                });
            }

            let record = TransitionRecord {
                run_id: run.id(),
                sequence: run.step_count(),
                from: run.current_state().clone(),
                to: next,
                payload: run.payload().clone(),
                timestamp: Utc::now(),
            };

            self.log.append(&record)?;
            debug!(
                run_id = %record.run_id,
                sequence = record.sequence,
                from = %record.from,
                to = %record.to,
                "Recorded transition"
            );

            run.advance(record);
        }
    }
}

impl<P: Payload> fmt::Debug for WorkflowEngine<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
