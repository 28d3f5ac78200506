//! Result and error types for Vitrine.

use crate::assertion::Mismatch;
use thiserror::Error;

/// Result type for Vitrine operations
pub type VitrineResult<T> = Result<T, VitrineError>;

/// Errors that can occur while driving a page or running a test
#[derive(Debug, Error)]
pub enum VitrineError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set VITRINE_CHROMIUM_PATH")]
    BrowserNotFound,

    /// The automation channel itself failed (session closed, protocol error)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A locator matched nothing within its timeout
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector description
        selector: String,
    },

    /// A locator matched but the element could not be acted on
    #[error("Element {selector} is not interactable: {reason}")]
    NotInteractable {
        /// Selector description
        selector: String,
        /// Why the action was refused
        reason: String,
    },

    /// Hard assertion failed
    #[error("Assertion failed: {mismatch}")]
    AssertionFailed {
        /// What was compared
        mismatch: Mismatch,
    },

    /// Soft assertions recorded during a test, reported at test end
    #[error("{} soft assertion(s) failed:\n{}", failures.len(), format_mismatches(failures))]
    SoftAssertions {
        /// Every recorded mismatch, in recording order
        failures: Vec<Mismatch>,
    },

    /// A decoding oracle could not produce output
    #[error("Decode failed: {message}")]
    Decode {
        /// Error message
        message: String,
    },

    /// A fixture factory failed or an unknown fixture was requested
    #[error("Setup of fixture '{fixture}' failed: {message}")]
    Setup {
        /// Fixture name
        fixture: String,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// REST API request failed
    #[error("API request failed: {message}")]
    Api {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

fn format_mismatches(failures: &[Mismatch]) -> String {
    failures
        .iter()
        .enumerate()
        .map(|(i, m)| format!("  {}. {m}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

impl VitrineError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a decode error
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a setup error for a fixture
    #[must_use]
    pub fn setup(fixture: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Setup {
            fixture: fixture.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an API error
    #[must_use]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Environment or fixture wiring is broken, not the behaviour under test
    #[must_use]
    pub const fn is_setup(&self) -> bool {
        matches!(self, Self::Setup { .. })
    }

    /// A comparison against the page or a value failed
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(
            self,
            Self::AssertionFailed { .. } | Self::SoftAssertions { .. }
        )
    }

    /// A UI element did not appear or could not be acted on
    #[must_use]
    pub const fn is_interaction(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::NotInteractable { .. } | Self::Timeout { .. }
        )
    }
}
