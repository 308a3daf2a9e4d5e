//! Error types for the auth module

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur during authentication
#[derive(Debug, Error)]
pub enum AuthError {
    /// Refreshing a cached credential failed; a fresh login can recover
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// OAuth2 authorization failed
    #[error("OAuth2 authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Token exchange failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Failed to start local callback server
    #[error("Failed to start callback server: {0}")]
    CallbackServerFailed(String),

    /// Client secret file missing or malformed
    #[error("Client secret error: {0}")]
    ClientSecretError(String),

    /// Credential cache could not be read or written
    #[error("Credential cache error: {0}")]
    CacheError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AuthError {
    /// Whether the caller can fall back to a fresh interactive login
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AuthError::TokenRefreshFailed(_))
    }
}
