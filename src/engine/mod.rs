//! Workflow execution.
//!
//! The engine owns each run for its lifetime and moves it through
//! `Idle -> Running -> Completed | Aborted`:
//!
//! 1. Resolve the handler for the current state
//! 2. Ask it for a decision about the payload
//! 3. On `Advance`, durably append the transition, then loop
//! 4. On `Terminal`, complete the run
//!
//! The loop is iterative and bounded by `max_steps`, so cyclic workflows
//! terminate with `CycleLimitExceeded` instead of running forever.

mod error;
mod machine;
mod run;

pub use error::WorkflowError;
pub use machine::WorkflowEngine;
pub use run::{CancelToken, RunOptions, RunResult, RunStatus, WorkflowRun};
