//! Builder API for ergonomic engine construction.

pub mod engine;
pub mod error;

pub use engine::WorkflowBuilder;
pub use error::BuildError;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigViolation, EngineConfig};
    use crate::handler::{advance_to, terminal};
    use crate::log::MemoryTransitionLog;
    use crate::registry::StateRegistry;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn builder_requires_log() {
        let result = WorkflowBuilder::<String>::new()
            .handler("Producer", terminal())
            .build();

        assert!(matches!(result, Err(BuildError::MissingLog)));
    }

    #[test]
    fn builder_requires_states() {
        let result = WorkflowBuilder::<String>::new()
            .log(MemoryTransitionLog::new())
            .build();

        assert!(matches!(result, Err(BuildError::NoStates)));
    }

    #[test]
    fn builder_reports_every_config_violation() {
        let result = WorkflowBuilder::<String>::new()
            .handler("Producer", terminal())
            .log(MemoryTransitionLog::new())
            .config(EngineConfig {
                max_steps: 0,
                run_timeout_ms: Some(0),
            })
            .build();

        match result {
            Err(BuildError::InvalidConfig(violations)) => {
                assert_eq!(violations.len(), 2);
                assert!(violations.contains(&ConfigViolation::MaxStepsZero));
                assert!(violations.contains(&ConfigViolation::ZeroTimeout));
            }
            _ => panic!("Expected invalid config"),
        }
    }

    #[test]
    fn builder_registers_into_shared_registry() {
        let registry = Arc::new(StateRegistry::<String>::new());
        registry.register_handler("Retailer", terminal());

        let engine = WorkflowBuilder::new()
            .registry(Arc::clone(&registry))
            .handler("Producer", advance_to("Retailer"))
            .log(MemoryTransitionLog::new())
            .build()
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(engine.start("Producer", "widget".to_string()).is_completed());
    }

    #[test]
    fn builder_applies_step_bound() {
        let engine = WorkflowBuilder::<String>::new()
            .handler("Ping", advance_to("Pong"))
            .handler("Pong", advance_to("Ping"))
            .log(MemoryTransitionLog::new())
            .max_steps(4)
            .build()
            .unwrap();

        let result = engine.start("Ping", "ball".to_string());
        assert_eq!(engine.config().max_steps, 4);
        assert_eq!(result.steps(), 4);
        assert!(result.is_aborted());
    }

    #[test]
    fn sub_millisecond_timeout_rounds_up() {
        let engine = WorkflowBuilder::<String>::new()
            .handler("Producer", terminal())
            .log(MemoryTransitionLog::new())
            .run_timeout(Duration::from_micros(300))
            .build()
            .unwrap();

        assert_eq!(engine.config().run_timeout_ms, Some(1));
        assert_eq!(engine.config().run_timeout(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn builder_timeout_sets_run_deadline() {
        let engine = WorkflowBuilder::<String>::new()
            .state("Producer", |_ctx: &crate::handler::WorkflowContext| {
                Box::new(crate::handler::handler_fn(|_p: &String| {
                    std::thread::sleep(Duration::from_millis(60));
                    crate::handler::StateDecision::advance("Retailer")
                }))
            })
            .handler("Retailer", advance_to("Consumer"))
            .handler("Consumer", terminal())
            .log(MemoryTransitionLog::new())
            .run_timeout(Duration::from_millis(15))
            .build()
            .unwrap();

        let result = engine.start("Producer", "widget".to_string());

        assert!(matches!(
            result.error(),
            Some(crate::engine::WorkflowError::DeadlineExceeded { .. })
        ));
        assert_eq!(result.steps(), 1);
    }
}
