//! Context handed to handler factories.

use crate::core::{RunId, StateName};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Where a run stands when a handler is constructed for it.
#[derive(Clone, Debug)]
pub struct WorkflowContext {
    pub run_id: RunId,
    pub initial_state: StateName,
    pub current_state: StateName,
    /// Number of transitions recorded so far
    pub step: u64,
    pub started_at: DateTime<Utc>,
}

impl WorkflowContext {
    /// Time since the run started, read from the wall clock.
    ///
    /// Zero if `started_at` lies in the future.
    pub fn elapsed(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the handler is running for the run's first state
    pub fn is_first_step(&self) -> bool {
        self.step == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn context(started_at: DateTime<Utc>, step: u64) -> WorkflowContext {
        WorkflowContext {
            run_id: Uuid::new_v4(),
            initial_state: StateName::from("Producer"),
            current_state: StateName::from("Retailer"),
            step,
            started_at,
        }
    }

    #[test]
    fn elapsed_measures_from_run_start() {
        let ctx = context(Utc::now() - chrono::Duration::seconds(5), 1);
        assert!(ctx.elapsed() >= Duration::from_secs(5));
        assert!(!ctx.is_first_step());
    }

    #[test]
    fn elapsed_is_zero_for_future_start() {
        let ctx = context(Utc::now() + chrono::Duration::seconds(60), 0);
        assert_eq!(ctx.elapsed(), Duration::ZERO);
        assert!(ctx.is_first_step());
    }
}
