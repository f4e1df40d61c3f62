//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// A mini-game configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The engine event loop is no longer running.
    #[error("interaction engine has stopped")]
    EngineStopped,

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
