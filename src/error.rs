//! Error types for Flasky.

use thiserror::Error;

/// Common error type for Flasky.
#[derive(Error, Debug)]
pub enum FlaskyError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Outgoing mail error.
    #[error("mail error: {0}")]
    Mail(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for FlaskyError {
    fn from(e: sqlx::Error) -> Self {
        FlaskyError::Database(e.to_string())
    }
}

/// Result type alias for Flasky operations.
pub type Result<T> = std::result::Result<T, FlaskyError>;
