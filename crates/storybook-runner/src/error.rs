//! Storybook runner: error types.

use storybook_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the runner.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The game definition parsed but describes an impossible game.
    #[error("invalid game definition: {0}")]
    Definition(String),

    /// The game definition is not valid YAML for the expected shape.
    #[error("failed to parse game definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading the game definition failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine rejected the configuration or stopped early.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The engine task panicked or was cancelled.
    #[error("engine task failed: {0}")]
    Engine(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_display_unchanged() {
        let err = AppError::from(DomainError::EngineStopped);

        assert_eq!(err.to_string(), DomainError::EngineStopped.to_string());
    }

    #[test]
    fn test_definition_error_names_the_problem() {
        let err = AppError::Definition("unknown answer label \"maybe\"".into());

        assert_eq!(
            err.to_string(),
            "invalid game definition: unknown answer label \"maybe\""
        );
    }
}
