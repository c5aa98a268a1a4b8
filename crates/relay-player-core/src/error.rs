//! Error types for Relay Player Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Resolution errors
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Relay URL does not start with prefix {prefix}")]
    NotARelayUrl { prefix: String },

    // Playback errors
    #[error("Autoplay blocked: {reason}")]
    AutoplayBlocked { reason: String },

    #[error("Adaptive engine not available: {0}")]
    EngineUnavailable(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid URL error from any displayable cause
    pub fn invalid_url(msg: impl std::fmt::Display) -> Self {
        Error::InvalidUrl(msg.to_string())
    }

    /// Returns true if the user can recover without changing the input
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::AutoplayBlocked { .. })
    }

    /// Returns the error code for status reporting and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::NotARelayUrl { .. } => "NOT_RELAY_URL",
            Error::AutoplayBlocked { .. } => "AUTOPLAY_BLOCKED",
            Error::EngineUnavailable(_) => "ENGINE_UNAVAILABLE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
            Error::Io(_) => "IO",
        }
    }
}
