//! Registry mapping state names to handler factories.
//!
//! The set of known states is open to extension by registration; the engine
//! itself never changes when a state is added.

pub mod error;

pub use error::RegistryError;

use crate::core::{Payload, StateName};
use crate::handler::{StateHandler, WorkflowContext};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Constructor for a handler bound to a run's context.
pub type HandlerFactory<P> =
    Arc<dyn Fn(&WorkflowContext) -> Box<dyn StateHandler<P>> + Send + Sync>;

/// Maps state names to handler factories.
///
/// Lookups take a read lock and are safe from many runs at once.
/// Re-registering a name replaces the previous factory.
///
/// # Example
///
/// ```rust
/// use statewright::handler::{advance_to, terminal};
/// use statewright::registry::StateRegistry;
///
/// let registry: StateRegistry<String> = StateRegistry::new();
/// registry.register_handler("Producer", advance_to("Retailer"));
/// registry.register_handler("Retailer", terminal());
///
/// assert!(registry.contains("Producer"));
/// assert!(!registry.contains("producer"));
/// assert_eq!(registry.len(), 2);
/// ```
pub struct StateRegistry<P: Payload> {
    factories: RwLock<HashMap<StateName, HandlerFactory<P>>>,
}

impl<P: Payload> StateRegistry<P> {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register<F>(&self, name: impl Into<StateName>, factory: F)
    where
        F: Fn(&WorkflowContext) -> Box<dyn StateHandler<P>> + Send + Sync + 'static,
    {
        self.register_factory(name, Arc::new(factory));
    }

    /// Register an already shared factory under `name`.
    pub fn register_factory(&self, name: impl Into<StateName>, factory: HandlerFactory<P>) {
        let name = name.into();
        let replaced = self.factories.write().insert(name.clone(), factory).is_some();
        debug!(state = %name, replaced, "Registered state handler");
    }

    /// Register a handler prototype that is cloned for every resolution.
    pub fn register_handler<H>(&self, name: impl Into<StateName>, handler: H)
    where
        H: StateHandler<P> + Clone + Sync + 'static,
    {
        self.register(
            name,
            move |_ctx: &WorkflowContext| -> Box<dyn StateHandler<P>> { Box::new(handler.clone()) },
        );
    }

    /// Remove a state. Returns whether it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.factories.write().remove(name).is_some()
    }

    /// Construct the handler for `name`.
    ///
    /// The factory runs outside the registry lock.
    pub fn resolve(
        &self,
        name: &StateName,
        context: &WorkflowContext,
    ) -> Result<Box<dyn StateHandler<P>>, RegistryError> {
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownState {
                name: name.to_string(),
            })?;
        Ok(factory(context))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<StateName> {
        let mut names: Vec<StateName> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }
}

impl<P: Payload> Default for StateRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Payload> fmt::Debug for StateRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateRegistry")
            .field("states", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{advance_to, handler_fn, terminal, StateDecision};
    use chrono::Utc;
    use uuid::Uuid;

    fn context(state: &str) -> WorkflowContext {
        WorkflowContext {
            run_id: Uuid::new_v4(),
            initial_state: StateName::from("Producer"),
            current_state: StateName::from(state),
            step: 0,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn resolve_returns_registered_handler() {
        let registry: StateRegistry<String> = StateRegistry::new();
        registry.register_handler("Producer", advance_to("Retailer"));

        let handler = registry
            .resolve(&StateName::from("Producer"), &context("Producer"))
            .unwrap();

        assert_eq!(
            handler.process(&"widget".to_string()),
            StateDecision::advance("Retailer")
        );
    }

    #[test]
    fn resolve_unknown_state_fails() {
        let registry: StateRegistry<String> = StateRegistry::new();
        let result = registry.resolve(&StateName::from("Wholesaler"), &context("Wholesaler"));

        assert_eq!(
            result.err(),
            Some(RegistryError::UnknownState {
                name: "Wholesaler".to_string()
            })
        );
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let registry: StateRegistry<String> = StateRegistry::new();
        registry.register_handler("Consumer", terminal());

        assert!(registry
            .resolve(&StateName::from("consumer"), &context("consumer"))
            .is_err());
    }

    #[test]
    fn last_registration_wins() {
        let registry: StateRegistry<String> = StateRegistry::new();
        registry.register_handler("Recycler", advance_to("Producer"));
        registry.register_handler("Recycler", terminal());

        let handler = registry
            .resolve(&StateName::from("Recycler"), &context("Recycler"))
            .unwrap();

        assert!(handler.process(&"widget".to_string()).is_terminal());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn factory_receives_context() {
        let registry: StateRegistry<String> = StateRegistry::new();
        registry.register("Producer", |ctx: &WorkflowContext| {
            let first = ctx.is_first_step();
            Box::new(handler_fn(move |_p: &String| {
                if first {
                    StateDecision::advance("Retailer")
                } else {
                    StateDecision::Terminal
                }
            }))
        });

        let mut ctx = context("Producer");
        let first = registry.resolve(&ctx.current_state, &ctx).unwrap();
        assert_eq!(
            first.process(&"widget".to_string()),
            StateDecision::advance("Retailer")
        );

        ctx.step = 4;
        let later = registry.resolve(&ctx.current_state, &ctx).unwrap();
        assert!(later.process(&"widget".to_string()).is_terminal());
    }

    #[test]
    fn names_are_sorted_and_unregister_removes() {
        let registry: StateRegistry<String> = StateRegistry::new();
        registry.register_handler("Retailer", terminal());
        registry.register_handler("Consumer", terminal());
        registry.register_handler("Producer", terminal());

        assert_eq!(registry.names(), vec!["Consumer", "Producer", "Retailer"]);
        assert!(registry.unregister("Consumer"));
        assert!(!registry.unregister("Consumer"));
        assert_eq!(registry.len(), 2);
    }
}
