//! The product lifecycle workflow.
//!
//! A product is channelled `Producer -> Retailer -> Consumer -> Recycler`.
//! What the Recycler does next depends on the [`RecyclePolicy`]: end the
//! product's life, or send it back to the Producer for another loop.
//!
//! # Example
//!
//! ```rust
//! use statewright::engine::WorkflowEngine;
//! use statewright::lifecycle::{register_product_lifecycle, RecyclePolicy, PRODUCER};
//! use statewright::log::MemoryTransitionLog;
//! use statewright::registry::StateRegistry;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(StateRegistry::<String>::new());
//! register_product_lifecycle(&registry, RecyclePolicy::EndOfLife);
//!
//! let engine = WorkflowEngine::new(registry, Arc::new(MemoryTransitionLog::<String>::new()));
//! let result = engine.start(PRODUCER, "widget".to_string());
//!
//! assert!(result.is_completed());
//! assert_eq!(result.steps(), 3);
//! ```

use crate::core::{Payload, State, StateName};
use crate::handler::{StateDecision, StateHandler};
use crate::log::plain_journal_line;
use crate::registry::StateRegistry;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const PRODUCER: &str = "Producer";
pub const RETAILER: &str = "Retailer";
pub const CONSUMER: &str = "Consumer";
pub const RECYCLER: &str = "Recycler";

/// The closed set of lifecycle stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Producer,
    Retailer,
    Consumer,
    Recycler,
}

impl State for Stage {
    fn name(&self) -> &str {
        match self {
            Self::Producer => PRODUCER,
            Self::Retailer => RETAILER,
            Self::Consumer => CONSUMER,
            Self::Recycler => RECYCLER,
        }
    }
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Producer,
        Stage::Retailer,
        Stage::Consumer,
        Stage::Recycler,
    ];

    /// Look a stage up by its exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.name() == name)
    }

    /// The stage a product normally moves to next.
    pub fn successor(&self) -> Stage {
        match self {
            Self::Producer => Self::Retailer,
            Self::Retailer => Self::Consumer,
            Self::Consumer => Self::Recycler,
            Self::Recycler => Self::Producer,
        }
    }

    pub fn state_name(&self) -> StateName {
        StateName::from(self.name())
    }
}

/// What happens to a product once it reaches the Recycler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecyclePolicy {
    /// The Recycler is terminal
    #[default]
    EndOfLife,

    /// The Recycler feeds the product back to the Producer
    Recirculate,
}

/// Journal narration for moving `product` between two stages.
pub fn channel_message(from: Stage, to: Stage, product: &impl Display) -> String {
    if from == Stage::Recycler {
        format!(
            "Channelling recycled {} from the {} to the {}",
            product,
            from.name(),
            to.name()
        )
    } else {
        format!(
            "Channelling {} from the {} to the {}",
            product,
            from.name(),
            to.name()
        )
    }
}

/// Journal line for a transition, narrated when both ends are stages.
///
/// Plug into [`FileTransitionLog::with_journal_format`](crate::log::FileTransitionLog::with_journal_format).
/// Other state names fall back to the plain `from -> to: payload` form.
pub fn narrate_transition(from: &StateName, to: &StateName, product: &dyn Display) -> String {
    match (Stage::from_name(from.as_str()), Stage::from_name(to.as_str())) {
        (Some(from), Some(to)) => channel_message(from, to, &product),
        _ => plain_journal_line(from, to, product),
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Producer;

#[derive(Clone, Copy, Debug, Default)]
pub struct Retailer;

#[derive(Clone, Copy, Debug, Default)]
pub struct Consumer;

#[derive(Clone, Copy, Debug, Default)]
pub struct Recycler {
    pub policy: RecyclePolicy,
}

impl<P: Payload> StateHandler<P> for Producer {
    fn process(&self, _payload: &P) -> StateDecision {
        StateDecision::Advance(Stage::Producer.successor().state_name())
    }
}

impl<P: Payload> StateHandler<P> for Retailer {
    fn process(&self, _payload: &P) -> StateDecision {
        StateDecision::Advance(Stage::Retailer.successor().state_name())
    }
}

impl<P: Payload> StateHandler<P> for Consumer {
    fn process(&self, _payload: &P) -> StateDecision {
        StateDecision::Advance(Stage::Consumer.successor().state_name())
    }
}

impl<P: Payload> StateHandler<P> for Recycler {
    fn process(&self, _payload: &P) -> StateDecision {
        match self.policy {
            RecyclePolicy::EndOfLife => StateDecision::Terminal,
            RecyclePolicy::Recirculate => {
                StateDecision::Advance(Stage::Recycler.successor().state_name())
            }
        }
    }
}

/// Register all four lifecycle stages.
pub fn register_product_lifecycle<P: Payload>(registry: &StateRegistry<P>, policy: RecyclePolicy) {
    registry.register_handler(PRODUCER, Producer);
    registry.register_handler(RETAILER, Retailer);
    registry.register_handler(CONSUMER, Consumer);
    registry.register_handler(RECYCLER, Recycler { policy });
}
