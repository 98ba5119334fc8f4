//! Statewright: a finite-state workflow engine with a durable transition log
//!
//! A run starts in a named state with a payload. The handler registered for
//! that state decides what comes next; the engine records the transition,
//! resolves the next handler and repeats until a handler declares the run
//! terminal or the step bound is hit.
//!
//! # Core Concepts
//!
//! - **Registry**: Maps state names to handler factories
//! - **Handlers**: Pure business logic returning a `StateDecision`
//! - **Transition log**: Append-only, ordered, durable record of every move
//! - **Engine**: Iterative run loop with explicit abort reasons
//!
//! # Example
//!
//! ```rust
//! use statewright::builder::WorkflowBuilder;
//! use statewright::engine::RunStatus;
//! use statewright::handler::{advance_to, terminal};
//! use statewright::log::MemoryTransitionLog;
//!
//! let engine = WorkflowBuilder::<String>::new()
//!     .handler("Producer", advance_to("Retailer"))
//!     .handler("Retailer", advance_to("Consumer"))
//!     .handler("Consumer", advance_to("Recycler"))
//!     .handler("Recycler", terminal())
//!     .log(MemoryTransitionLog::new())
//!     .build()
//!     .unwrap();
//!
//! let result = engine.start("Producer", "widget".to_string());
//! assert_eq!(result.status, RunStatus::Completed);
//!
//! let path = result.history.get_path();
//! assert_eq!(path, vec!["Producer", "Retailer", "Consumer", "Recycler"]);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod engine;
pub mod handler;
pub mod lifecycle;
pub mod log;
pub mod registry;

// Re-export commonly used types
pub use builder::{BuildError, WorkflowBuilder};
pub use checkpoint::{CheckpointError, RunCheckpoint};
pub use config::EngineConfig;
pub use crate::core::{Payload, RunHistory, RunId, State, StateName, TransitionRecord};
pub use engine::{CancelToken, RunOptions, RunResult, RunStatus, WorkflowEngine, WorkflowError};
pub use handler::{StateDecision, StateHandler, WorkflowContext};
pub use log::{FileTransitionLog, LogError, MemoryTransitionLog, TransitionLog};
pub use registry::{RegistryError, StateRegistry};
