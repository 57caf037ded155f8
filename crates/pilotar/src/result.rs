//! Result and error types for Pilotar.

use thiserror::Error;

/// Result type for Pilotar operations
pub type PilotarResult<T> = Result<T, PilotarError>;

/// Errors that can occur in Pilotar
///
/// Action-level faults (selector not found, navigation timeout) never reach
/// this type from the execution path: the executor converts them into failed
/// `ActionResult` values. The variants below cover everything that happens
/// outside a single action dispatch.
#[derive(Debug, Error)]
pub enum PilotarError {
    /// Missing or invalid configuration (provider selection, credentials)
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Browser launch error (suite-fatal: the run aborts before any case)
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page-level error from the browser session
    #[error("Page error: {message}")]
    Page {
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

    /// Element lookup failed
    #[error("Selector {selector:?} not found: {message}")]
    SelectorNotFound {
        /// CSS selector that failed
        selector: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// AI advisory call failed (case-level: converts the case to Failed)
    #[error("AI call failed: {message}")]
    Advisory {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Test-case document could not be loaded
    #[error("Failed to load test cases: {message}")]
    TestCaseLoad {
        /// Error message
        message: String,
    },

    /// Report output error
    #[error("Report generation failed: {message}")]
    Report {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PilotarError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an advisory error
    #[must_use]
    pub fn advisory(message: impl Into<String>) -> Self {
        Self::Advisory {
            message: message.into(),
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create a screenshot error
    #[must_use]
    pub fn screenshot(message: impl Into<String>) -> Self {
        Self::Screenshot {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = PilotarError::config("AI_PROVIDER not set");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("AI_PROVIDER"));
    }

    #[test]
    fn test_advisory_error_display() {
        let err = PilotarError::advisory("connection refused");
        assert!(err.to_string().contains("AI call failed"));
    }

    #[test]
    fn test_navigation_error_carries_url() {
        let err = PilotarError::Navigation {
            url: "https://example.com".to_string(),
            message: "timeout".to_string(),
        };
        assert!(err.to_string().contains("https://example.com"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PilotarError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
