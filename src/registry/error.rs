//! Registry error types.

use thiserror::Error;

/// Errors that can occur when resolving state handlers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// No factory is registered under this exact name
    #[error("Unknown state '{name}'")]
    UnknownState { name: String },
}
