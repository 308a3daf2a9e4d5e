//! Error types for the core module

use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Authentication error
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Gmail API error
    #[error("Gmail error: {0}")]
    GmailError(String),

    /// Date arithmetic or formatting error
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Output file could not be written
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<reportdrop_auth::AuthError> for CoreError {
    fn from(e: reportdrop_auth::AuthError) -> Self {
        CoreError::AuthError(e.to_string())
    }
}

impl From<reportdrop_gmail::GmailError> for CoreError {
    fn from(e: reportdrop_gmail::GmailError) -> Self {
        CoreError::GmailError(e.to_string())
    }
}
