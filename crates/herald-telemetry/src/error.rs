//! Errors from building or installing the log subscriber.

use thiserror::Error;

/// Why [`setup_logging`](crate::setup_logging) failed.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A level, directive or format string did not parse.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A global subscriber was already installed.
    #[error("Initialization error: {0}")]
    InitError(String),
}

/// Result type for logging setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
