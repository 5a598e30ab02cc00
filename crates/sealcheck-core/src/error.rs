use thiserror::Error;

/// Application-wide error types for sealcheck.
#[derive(Error, Debug)]
pub enum AppError {
    /// The browser process could not be started or configured.
    #[error("Browser launch error: {0}")]
    BrowserLaunch(String),

    /// The target page could not be opened.
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Navigation or network idle did not complete in time.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A locator expression could not be parsed.
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// An in-page script (probe, click, content read) failed.
    #[error("Script error: {0}")]
    Script(String),

    /// Capturing or writing a screenshot failed.
    #[error("Screenshot error: {0}")]
    Screenshot(String),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    /// Returns true if this error happened before any check could be asserted.
    ///
    /// Setup failures terminate the run; everything else is recorded against
    /// the check or artifact that produced it.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            AppError::BrowserLaunch(_)
                | AppError::Navigation(_)
                | AppError::Timeout(_)
                | AppError::ConfigError(_)
                | AppError::InvalidLocator(_)
        )
    }
}
