//! Builder for constructing workflow engines.

use crate::builder::error::BuildError;
use crate::config::{ConfigError, EngineConfig};
use crate::core::{Payload, StateName};
use crate::engine::WorkflowEngine;
use crate::handler::{StateHandler, WorkflowContext};
use crate::log::TransitionLog;
use crate::registry::{HandlerFactory, StateRegistry};
use std::sync::Arc;
use std::time::Duration;

/// Builder for constructing workflow engines with a fluent API.
///
/// # Example
///
/// ```rust
/// use statewright::builder::WorkflowBuilder;
/// use statewright::handler::{advance_to, terminal};
/// use statewright::log::MemoryTransitionLog;
///
/// let engine = WorkflowBuilder::<String>::new()
///     .handler("Producer", advance_to("Retailer"))
///     .handler("Retailer", terminal())
///     .log(MemoryTransitionLog::new())
///     .max_steps(10)
///     .build()
///     .unwrap();
///
/// assert!(engine.start("Producer", "widget".to_string()).is_completed());
/// ```
pub struct WorkflowBuilder<P: Payload> {
    registry: Option<Arc<StateRegistry<P>>>,
    states: Vec<(StateName, HandlerFactory<P>)>,
    log: Option<Arc<dyn TransitionLog<P>>>,
    config: EngineConfig,
}

impl<P: Payload> WorkflowBuilder<P> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            registry: None,
            states: Vec::new(),
            log: None,
            config: EngineConfig::default(),
        }
    }

    /// Use an existing, possibly shared registry.
    ///
    /// States added with [`state`](Self::state) or
    /// [`handler`](Self::handler) are registered into it on build.
    pub fn registry(mut self, registry: Arc<StateRegistry<P>>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Add a state with a handler factory.
    pub fn state<F>(mut self, name: impl Into<StateName>, factory: F) -> Self
    where
        F: Fn(&WorkflowContext) -> Box<dyn StateHandler<P>> + Send + Sync + 'static,
    {
        self.states.push((name.into(), Arc::new(factory)));
        self
    }

    /// Add a state with a cloneable handler prototype.
    pub fn handler<H>(self, name: impl Into<StateName>, handler: H) -> Self
    where
        H: StateHandler<P> + Clone + Sync + 'static,
    {
        self.state(
            name,
            move |_ctx: &WorkflowContext| -> Box<dyn StateHandler<P>> { Box::new(handler.clone()) },
        )
    }

    /// Set the transition log (required).
    pub fn log<L>(mut self, log: L) -> Self
    where
        L: TransitionLog<P> + 'static,
    {
        self.log = Some(Arc::new(log));
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a JSON file.
    pub fn config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let config = EngineConfig::from_file(path)?;
        Ok(self.config(config))
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.config.max_steps = max_steps;
        self
    }

    /// Set the whole-run timeout, rounded up to the next millisecond.
    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.config.run_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    /// Build the engine.
    /// Returns an error if required parts are missing or the config is invalid.
    pub fn build(self) -> Result<WorkflowEngine<P>, BuildError> {
        let log = self.log.ok_or(BuildError::MissingLog)?;

        if let Err(err) = self.config.check() {
            return Err(match err {
                ConfigError::Invalid(violations) => BuildError::InvalidConfig(violations),
                other => BuildError::Config(other),
            });
        }

        let registry = self.registry.unwrap_or_default();
        for (name, factory) in self.states {
            registry.register_factory(name, factory);
        }
        if registry.is_empty() {
            return Err(BuildError::NoStates);
        }

        Ok(WorkflowEngine::from_parts(registry, log, self.config))
    }
}

impl<P: Payload> Default for WorkflowBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
