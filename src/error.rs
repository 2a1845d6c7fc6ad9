// src/error.rs

//! Unified error handling for the word feed.

use std::fmt;

use thiserror::Error;

/// Result type alias for word feed operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Persisted word store could not be parsed
    #[error("Corrupt word store at {location}: {message}")]
    CorruptStore { location: String, message: String },

    /// Date string is not a canonical calendar date
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// An entry already exists for this date
    #[error("Date {0} already has a word")]
    DateTaken(String),

    /// Generator adapter failed (transport or malformed response)
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Verifier adapter failed (transport or malformed response)
    #[error("Verification failed: {0}")]
    Verification(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Shared secret mismatch
    #[error("Unauthorized: shared secret does not match")]
    Unauthorized,

    /// Remote content changed between read and write
    #[error("Remote store changed since it was read: {0}")]
    Conflict(String),

    /// Remote store returned an unexpected response
    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },
}

impl AppError {
    /// Create a corrupt store error.
    pub fn corrupt(location: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::CorruptStore {
            location: location.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a generator adapter error.
    pub fn generation(message: impl fmt::Display) -> Self {
        Self::Generation(message.to_string())
    }

    /// Create a verifier adapter error.
    pub fn verification(message: impl fmt::Display) -> Self {
        Self::Verification(message.to_string())
    }

    /// Create a remote error from an HTTP status and body.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Whether this error must abort the whole run rather than one date.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Generation(_) | Self::Verification(_))
    }
}
