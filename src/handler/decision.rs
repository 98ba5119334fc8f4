//! Handler trait and the decisions handlers return.

use crate::core::{Payload, StateName};
use std::fmt;
use std::marker::PhantomData;

/// What a handler wants to happen after processing the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateDecision {
    /// Proceed to another named state
    Advance(StateName),

    /// The workflow reached a natural end
    Terminal,
}

impl StateDecision {
    pub fn advance(next: impl Into<StateName>) -> Self {
        Self::Advance(next.into())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }

    /// The successor state, if any.
    pub fn next_state(&self) -> Option<&StateName> {
        match self {
            Self::Advance(next) => Some(next),
            Self::Terminal => None,
        }
    }
}

/// Business logic for one workflow stage.
///
/// Handlers are expected to be fast and free of side effects apart from the
/// decision they return. An in-flight `process` call is never interrupted.
///
/// # Example
///
/// ```rust
/// use statewright::handler::{StateDecision, StateHandler};
///
/// struct Inspect;
///
/// impl StateHandler<String> for Inspect {
///     fn process(&self, payload: &String) -> StateDecision {
///         if payload.is_empty() {
///             StateDecision::Terminal
///         } else {
///             StateDecision::advance("Ship")
///         }
///     }
/// }
///
/// assert_eq!(Inspect.process(&"crate".to_string()), StateDecision::advance("Ship"));
/// ```
pub trait StateHandler<P: Payload>: Send {
    fn process(&self, payload: &P) -> StateDecision;
}

impl<P: Payload> StateHandler<P> for Box<dyn StateHandler<P>> {
    fn process(&self, payload: &P) -> StateDecision {
        (**self).process(payload)
    }
}

/// Handler backed by a closure. Built with [`handler_fn`].
pub struct FnHandler<P, F> {
    f: F,
    _payload: PhantomData<fn(&P)>,
}

impl<P, F: Clone> Clone for FnHandler<P, F> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _payload: PhantomData,
        }
    }
}

impl<P, F> fmt::Debug for FnHandler<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<P, F> StateHandler<P> for FnHandler<P, F>
where
    P: Payload,
    F: Fn(&P) -> StateDecision + Send,
{
    fn process(&self, payload: &P) -> StateDecision {
        (self.f)(payload)
    }
}

/// Create a handler from a closure over the payload.
///
/// ```rust
/// use statewright::handler::{handler_fn, StateDecision, StateHandler};
///
/// let handler = handler_fn(|p: &String| {
///     if p.starts_with("recalled") {
///         StateDecision::Terminal
///     } else {
///         StateDecision::advance("Retailer")
///     }
/// });
///
/// assert!(handler.process(&"recalled-widget".to_string()).is_terminal());
/// ```
pub fn handler_fn<P, F>(f: F) -> FnHandler<P, F>
where
    P: Payload,
    F: Fn(&P) -> StateDecision + Send,
{
    FnHandler {
        f,
        _payload: PhantomData,
    }
}

/// Handler that ignores the payload and always makes the same decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedDecision(StateDecision);

impl<P: Payload> StateHandler<P> for FixedDecision {
    fn process(&self, _payload: &P) -> StateDecision {
        self.0.clone()
    }
}

/// Handler that always advances to `next`.
pub fn advance_to(next: impl Into<StateName>) -> FixedDecision {
    FixedDecision(StateDecision::Advance(next.into()))
}

/// Handler that always ends the run.
pub fn terminal() -> FixedDecision {
    FixedDecision(StateDecision::Terminal)
}
