//! Core workflow types.
//!
//! This module contains the plain data of the engine:
//! - State naming via `StateName` and the `State` trait
//! - The `Payload` bound for work items
//! - Immutable transition records and run history
//!
//! Nothing in here performs I/O.

mod history;
mod state;

pub use history::{HistoryViolation, RunHistory, RunId, TransitionRecord};
pub use state::{Payload, State, StateName};
