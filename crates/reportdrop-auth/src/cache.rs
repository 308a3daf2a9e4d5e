//! Credential cache stored as a JSON file
//!
//! Keeps the token pair together with the client registration it was issued
//! to, so a later run can refresh it without reading the client secret file.

use crate::{AuthError, AuthResult, OAuth2Config, TokenPair};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A cached OAuth2 credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub auth_url: String,
    pub token_url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    /// Bind a token pair to the client configuration that produced it
    pub fn new(tokens: TokenPair, config: &OAuth2Config) -> Self {
        Self {
            tokens,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            scopes: config.scopes.clone(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }

    pub fn is_expired(&self) -> bool {
        self.tokens.is_expired()
    }

    /// Configuration used to refresh this credential
    pub fn oauth2_config(&self) -> OAuth2Config {
        OAuth2Config {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            auth_url: self.auth_url.clone(),
            token_url: self.token_url.clone(),
            scopes: self.scopes.clone(),
            redirect_port: 0,
        }
    }
}

/// File-backed store for a single credential
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached credential, `None` when the file does not exist
    pub fn load(&self) -> AuthResult<Option<Credential>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No credential cache at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let credential: Credential = serde_json::from_str(&json).map_err(|e| {
            AuthError::CacheError(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        debug!("Loaded cached credential from {}", self.path.display());
        Ok(Some(credential))
    }

    /// Write the credential, replacing any previous content
    pub fn store(&self, credential: &Credential) -> AuthResult<()> {
        let json = serde_json::to_vec_pretty(credential)
            .map_err(|e| AuthError::CacheError(format!("Failed to serialize credential: {}", e)))?;
        std::fs::write(&self.path, json)?;

        info!("Stored credential in {}", self.path.display());
        Ok(())
    }

    /// Remove the cache file if present
    pub fn clear(&self) -> AuthResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Deleted credential cache {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Credential {
        Credential {
            tokens: TokenPair {
                access_token: "ya29.a0".to_string(),
                refresh_token: Some("1//refresh".to_string()),
                expires_at: Some(1_726_000_000),
            },
            client_id: "client".to_string(),
            client_secret: Some("secret".to_string()),
            auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            scopes: vec![],
        }
    }

    #[test]
    fn test_missing_cache_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("token.json"));
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_store_overwrites_previous_credential() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("token.json"));

        cache.store(&sample()).unwrap();
        let mut updated = sample();
        updated.tokens.access_token = "ya29.b1".to_string();
        cache.store(&updated).unwrap();

        assert_eq!(cache.load().unwrap(), Some(updated));
    }

    #[test]
    fn test_tokens_are_flattened_on_disk() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["access_token"], "ya29.a0");
        assert_eq!(json["refresh_token"], "1//refresh");
        assert_eq!(json["client_id"], "client");
    }

    #[test]
    fn test_corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, b"\x80\x04pickle").unwrap();

        let err = TokenCache::new(&path).load().unwrap_err();
        assert!(matches!(err, AuthError::CacheError(_) | AuthError::IoError(_)));
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("token.json"));
        cache.store(&sample()).unwrap();

        cache.clear().unwrap();
        assert!(!cache.path().exists());
        // Clearing twice is fine
        cache.clear().unwrap();
    }
}
