//! Engine configuration.
//!
//! Validation uses Stillwater's `Validation` type so that every broken rule
//! is reported at once instead of stopping at the first.
//!
//! # Example
//!
//! ```rust
//! use statewright::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "max_steps": 10 }"#).unwrap();
//! assert_eq!(config.max_steps, 10);
//! assert!(config.run_timeout().is_none());
//! ```

pub mod violations;

pub use violations::{ConfigError, ConfigViolation};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Default bound on recorded transitions per run.
pub const DEFAULT_MAX_STEPS: usize = 100;

/// Largest `max_steps` accepted by validation.
pub const MAX_STEPS_CEILING: usize = 1_000_000;

/// Settings shared by every run of an engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of transitions a run may record
    pub max_steps: usize,

    /// Whole-run timeout, applied when a run has no explicit deadline
    pub run_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            run_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_ms.map(Duration::from_millis)
    }

    /// Check every rule, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigViolation>>> = Vec::new();

        checks.push(if self.max_steps == 0 {
            Validation::fail(ConfigViolation::MaxStepsZero)
        } else if self.max_steps > MAX_STEPS_CEILING {
            Validation::fail(ConfigViolation::MaxStepsTooLarge {
                max_steps: self.max_steps,
                ceiling: MAX_STEPS_CEILING,
            })
        } else {
            Validation::success(())
        });

        if let Some(timeout) = self.run_timeout_ms {
            checks.push(if timeout == 0 {
                Validation::fail(ConfigViolation::ZeroTimeout)
            } else {
                Validation::success(())
            });
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// [`validate`](Self::validate) as a `Result` listing every violation.
    pub fn check(&self) -> Result<(), ConfigError> {
        match self.validate() {
            Validation::Success(_) => Ok(()),
            Validation::Failure(violations) => {
                Err(ConfigError::Invalid(violations.iter().cloned().collect()))
            }
        }
    }
}
