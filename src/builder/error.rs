//! Build errors for the workflow builder.

use crate::config::{ConfigError, ConfigViolation};
use thiserror::Error;

/// Errors that can occur when building a workflow engine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Transition log not specified. Call .log(sink) before .build()")]
    MissingLog,

    #[error("No states registered. Add at least one state")]
    NoStates,

    #[error("Invalid engine configuration: {}", summarize(.0))]
    InvalidConfig(Vec<ConfigViolation>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn summarize(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
