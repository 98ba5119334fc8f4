//! State handlers: the business logic of each workflow stage.
//!
//! A handler looks at the payload and decides what comes next. It never
//! writes the transition log; the engine records every decision exactly once.

mod context;
mod decision;

pub use context::WorkflowContext;
pub use decision::{
    advance_to, handler_fn, terminal, FixedDecision, FnHandler, StateDecision, StateHandler,
};
