//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// The run could not start or finish
    #[error("Test execution failed: {message}")]
    TestExecution {
        /// Error message
        message: String,
    },

    /// The binary was built without a capability the command needs
    #[error("{feature} support not compiled in; rebuild with --features {feature}")]
    FeatureDisabled {
        /// Cargo feature name
        feature: &'static str,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Vitrine library error
    #[error("{0}")]
    Vitrine(#[from] vitrine::VitrineError),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a test execution error
    #[must_use]
    pub fn test_execution(message: impl Into<String>) -> Self {
        Self::TestExecution {
            message: message.into(),
        }
    }
}
