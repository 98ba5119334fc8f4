//! Configuration violations and loading errors.

use thiserror::Error;

/// A single rule broken by an [`EngineConfig`](super::EngineConfig).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigViolation {
    #[error("max_steps must be at least 1")]
    MaxStepsZero,

    #[error("max_steps ({max_steps}) exceeds the ceiling of {ceiling}")]
    MaxStepsTooLarge { max_steps: usize, ceiling: usize },

    #[error("run_timeout_ms must be greater than zero when set")]
    ZeroTimeout,
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid engine configuration ({} violations)", .0.len())]
    Invalid(Vec<ConfigViolation>),
}
