//! OAuth2 client configuration as downloaded from the Google Cloud console

use crate::{gmail, AuthError, AuthResult, OAuth2Config};
use serde::Deserialize;
use std::path::Path;

/// Client registration for an installed (or web) application
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    gmail::AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    gmail::TOKEN_URL.to_string()
}

/// Top-level shape of the downloaded JSON file
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Read the client secret file at `path`
    pub fn from_file(path: &Path) -> AuthResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AuthError::ClientSecretError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Parse the provider JSON, preferring the `installed` section
    pub fn from_json(json: &str) -> AuthResult<Self> {
        let file: ClientSecretFile = serde_json::from_str(json)
            .map_err(|e| AuthError::ClientSecretError(format!("Malformed client secret: {}", e)))?;

        file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidConfig(
                "Client secret file has neither an 'installed' nor a 'web' section".to_string(),
            )
        })
    }

    /// Build the OAuth2 configuration for the loopback flow
    pub fn oauth2_config(&self, scopes: &[String]) -> OAuth2Config {
        OAuth2Config {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            auth_url: self.auth_uri.clone(),
            token_url: self.token_uri.clone(),
            scopes: scopes.to_vec(),
            redirect_port: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_client() {
        let json = r#"{
            "installed": {
                "client_id": "123.apps.googleusercontent.com",
                "project_id": "sales",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "client_secret": "GOCSPX-secret",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secret.client_secret.as_deref(), Some("GOCSPX-secret"));

        let config = secret.oauth2_config(&["https://www.googleapis.com/auth/gmail.readonly".into()]);
        assert_eq!(config.token_url, "https://oauth2.googleapis.com/token");
        assert_eq!(config.redirect_port, 0);
        assert_eq!(config.scopes.len(), 1);
    }

    #[test]
    fn test_web_section_and_default_endpoints() {
        let secret = ClientSecret::from_json(r#"{"web": {"client_id": "abc"}}"#).unwrap();
        assert_eq!(secret.client_id, "abc");
        assert!(secret.client_secret.is_none());
        assert_eq!(secret.auth_uri, gmail::AUTH_URL);
        assert_eq!(secret.token_uri, gmail::TOKEN_URL);
    }

    #[test]
    fn test_missing_sections() {
        let err = ClientSecret::from_json(r#"{"other": {}}"#).unwrap_err();
        assert!(matches!(err, AuthError::InvalidConfig(_)));

        let err = ClientSecret::from_json("not json").unwrap_err();
        assert!(matches!(err, AuthError::ClientSecretError(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientSecret::from_file(&dir.path().join("key")).unwrap_err();
        assert!(matches!(err, AuthError::ClientSecretError(_)));
    }
}
