//! Authentication module for reportdrop
//!
//! Produces a usable Gmail access token by, in order:
//! 1. Reusing a still-valid credential from the local cache file
//! 2. Refreshing an expired cached credential with its refresh token
//! 3. Running the interactive OAuth2 loopback flow in the browser

mod cache;
mod client_secret;
mod error;
mod flow;

pub use cache::{Credential, TokenCache};
pub use client_secret::ClientSecret;
pub use error::{AuthError, AuthResult};
pub use flow::{OAuth2Config, OAuth2Flow, TokenPair};

use std::path::PathBuf;
use tracing::{info, warn};

/// Google OAuth2 endpoints and scopes
pub mod gmail {
    /// Default authorization endpoint
    pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
    /// Default token endpoint
    pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

    /// Read-only mailbox scope, enough for search and attachment download
    pub const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
}

/// Where credentials live and what to ask for
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Credential cache file, rewritten after every refresh or login
    pub token_cache_path: PathBuf,
    /// Client registration JSON, only read for the interactive flow
    pub client_secret_path: PathBuf,
    /// Scopes to request on a fresh login
    pub scopes: Vec<String>,
}

/// Result of looking at the credential cache
#[derive(Debug)]
pub enum CachedState {
    /// Cached credential is still valid and was used untouched
    Ready(Credential),
    /// Cached credential was expired and has been refreshed
    Refreshed(Credential),
    /// Nothing usable in the cache, a fresh login is needed
    Missing,
}

/// Resolves a credential from cache, refresh, or interactive login
pub struct Authenticator {
    settings: AuthSettings,
    cache: TokenCache,
}

impl Authenticator {
    pub fn new(settings: AuthSettings) -> Self {
        let cache = TokenCache::new(settings.token_cache_path.clone());
        Self { settings, cache }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Produce a ready-to-use credential
    ///
    /// Refresh failures fall back to a fresh login. Failures of the
    /// interactive flow are returned to the caller.
    pub async fn authenticate(&self) -> AuthResult<Credential> {
        let credential = match self.resolve_cached().await? {
            CachedState::Ready(credential) => {
                info!("Using cached credential");
                return Ok(credential);
            }
            CachedState::Refreshed(credential) => credential,
            CachedState::Missing => self.interactive_login().await?,
        };

        self.cache.store(&credential)?;
        Ok(credential)
    }

    /// Inspect the cache and refresh if needed, without ever prompting
    pub async fn resolve_cached(&self) -> AuthResult<CachedState> {
        let credential = match self.cache.load() {
            Ok(Some(credential)) => credential,
            Ok(None) => return Ok(CachedState::Missing),
            Err(e) => {
                warn!("Ignoring unreadable credential cache: {}", e);
                return Ok(CachedState::Missing);
            }
        };

        if !credential.is_expired() {
            return Ok(CachedState::Ready(credential));
        }

        if credential.tokens.refresh_token.is_none() {
            warn!("Cached credential expired and has no refresh token");
            return Ok(CachedState::Missing);
        }

        match self.refresh(&credential).await {
            Ok(refreshed) => {
                info!("Refreshed cached credential");
                Ok(CachedState::Refreshed(refreshed))
            }
            Err(e) if e.is_recoverable() => {
                warn!("{}. Starting fresh login.", e);
                Ok(CachedState::Missing)
            }
            Err(e) => Err(e),
        }
    }

    /// Refresh a credential against its own token endpoint
    ///
    /// Every failure is reported as [`AuthError::TokenRefreshFailed`].
    pub async fn refresh(&self, credential: &Credential) -> AuthResult<Credential> {
        let refresh_token = credential
            .tokens
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::TokenRefreshFailed("no refresh token".to_string()))?;

        let config = credential.oauth2_config();
        let flow = OAuth2Flow::new(config.clone())
            .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;
        let tokens = flow.refresh_token(refresh_token).await.map_err(|e| match e {
            AuthError::TokenRefreshFailed(_) => e,
            other => AuthError::TokenRefreshFailed(other.to_string()),
        })?;

        Ok(Credential::new(tokens, &config))
    }

    async fn interactive_login(&self) -> AuthResult<Credential> {
        let secret = ClientSecret::from_file(&self.settings.client_secret_path)?;

        if self.settings.scopes.is_empty() {
            warn!("No OAuth2 scopes configured; the provider may reject the request or grant no mailbox access");
        }

        let config = secret.oauth2_config(&self.settings.scopes);
        let mut flow = OAuth2Flow::new(config.clone())?;
        flow.bind_callback()?;
        let auth_url = flow.get_auth_url();

        println!("Please visit this URL to authorize this application: {}", auth_url);
        if let Err(e) = opener::open_browser(&auth_url) {
            warn!("Could not open a browser: {}", e);
        }

        let tokens = flow.wait_for_callback().await?;
        info!("Obtained new credential through interactive login");
        Ok(Credential::new(tokens, &config))
    }
}
