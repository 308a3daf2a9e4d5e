//! OAuth2 authorization code flow with PKCE over a loopback redirect
//!
//! Implements the installed-application flow (RFC 8252): a listener is bound
//! on 127.0.0.1 (an OS-assigned port by default), the user authorizes in the
//! browser, and the redirect carries the code back to us.

use crate::{AuthError, AuthResult};
use oauth2::{
    basic::{BasicClient, BasicTokenResponse},
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use tracing::{debug, info};

/// OAuth2 provider configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// OAuth2 client ID
    pub client_id: String,
    /// OAuth2 client secret (installed apps still receive one from Google)
    pub client_secret: Option<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Requested scopes, may be empty
    pub scopes: Vec<String>,
    /// Local port for the callback listener, 0 lets the OS choose
    pub redirect_port: u16,
}

/// Token pair containing access and refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    /// Access token for API calls
    pub access_token: String,
    /// Refresh token for obtaining new access tokens
    pub refresh_token: Option<String>,
    /// Token expiration timestamp (Unix seconds)
    pub expires_at: Option<i64>,
}

impl TokenPair {
    /// Check if the access token is expired or about to expire
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let now = chrono::Utc::now().timestamp();
                // Consider expired if less than 5 minutes remaining
                expires_at - now < 300
            }
            None => false,
        }
    }

    fn from_response(response: &BasicTokenResponse, fallback_refresh: Option<&str>) -> Self {
        let expires_at = response
            .expires_in()
            .map(|duration| chrono::Utc::now().timestamp() + duration.as_secs() as i64);

        Self {
            access_token: response.access_token().secret().clone(),
            refresh_token: response
                .refresh_token()
                .map(|t| t.secret().clone())
                .or_else(|| fallback_refresh.map(str::to_string)),
            expires_at,
        }
    }
}

/// Manages an OAuth2 authorization flow
pub struct OAuth2Flow {
    config: OAuth2Config,
    client: BasicClient,
    listener: Option<TcpListener>,
    pkce_verifier: Option<PkceCodeVerifier>,
    csrf_token: Option<CsrfToken>,
}

impl OAuth2Flow {
    /// Create a new OAuth2 flow
    pub fn new(config: OAuth2Config) -> AuthResult<Self> {
        let client_id = ClientId::new(config.client_id.clone());
        let client_secret = config.client_secret.clone().map(ClientSecret::new);
        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid token URL: {}", e)))?;

        // Google expects the client credentials in the form body
        let client = BasicClient::new(client_id, client_secret, auth_url, Some(token_url))
            .set_auth_type(AuthType::RequestBody);

        Ok(Self {
            config,
            client,
            listener: None,
            pkce_verifier: None,
            csrf_token: None,
        })
    }

    /// Bind the loopback listener and register its address as the redirect URI
    ///
    /// Returns the port actually bound.
    pub fn bind_callback(&mut self) -> AuthResult<u16> {
        let listener = TcpListener::bind(("127.0.0.1", self.config.redirect_port))
            .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?
            .port();

        let redirect_url = RedirectUrl::new(format!("http://127.0.0.1:{}/", port))
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid redirect URL: {}", e)))?;
        self.client = self.client.clone().set_redirect_uri(redirect_url);
        self.listener = Some(listener);

        info!("Listening for OAuth2 callback on port {}", port);
        Ok(port)
    }

    /// Generate the authorization URL for the user to visit
    pub fn get_auth_url(&mut self) -> String {
        // Generate PKCE challenge
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge)
            .add_extra_param("access_type", "offline");

        for scope in &self.config.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token) = auth_request.url();

        self.pkce_verifier = Some(pkce_verifier);
        self.csrf_token = Some(csrf_token);

        auth_url.to_string()
    }

    /// Wait for the OAuth2 callback and exchange the code for tokens
    ///
    /// Blocks on the loopback listener with no timeout. Requests that carry
    /// neither a code nor an error (favicon probes and the like) are answered
    /// and ignored.
    pub async fn wait_for_callback(&mut self) -> AuthResult<TokenPair> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| AuthError::InvalidConfig("Callback listener not bound".to_string()))?;

        let pkce_verifier = self
            .pkce_verifier
            .take()
            .ok_or_else(|| AuthError::InvalidConfig("Auth URL not generated".to_string()))?;

        let csrf_token = self
            .csrf_token
            .take()
            .ok_or_else(|| AuthError::InvalidConfig("Auth URL not generated".to_string()))?;

        let code = loop {
            let (mut stream, _) = listener
                .accept()
                .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?;

            let mut request_line = String::new();
            BufReader::new(&stream)
                .read_line(&mut request_line)
                .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?;

            debug!("Received callback request: {}", request_line.trim());

            match parse_callback_url(&request_line) {
                Ok(Some((code, state))) => {
                    if state != *csrf_token.secret() {
                        send_http_response(&mut stream, "Error", "Invalid state parameter");
                        return Err(AuthError::AuthorizationFailed(
                            "CSRF token mismatch".to_string(),
                        ));
                    }
                    send_http_response(
                        &mut stream,
                        "Success",
                        "You can close this window and return to the terminal.",
                    );
                    break code;
                }
                Ok(None) => {
                    send_http_response(&mut stream, "Waiting", "Waiting for authorization.");
                }
                Err(e) => {
                    send_http_response(&mut stream, "Error", &e.to_string());
                    return Err(e);
                }
            }
        };

        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        Ok(TokenPair::from_response(&token_response, None))
    }

    /// Refresh an access token using a refresh token
    ///
    /// The previous refresh token is kept when the provider does not rotate it.
    pub async fn refresh_token(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let token_response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

        Ok(TokenPair::from_response(&token_response, Some(refresh_token)))
    }
}

/// Parse the authorization code and state from a callback request line
///
/// Returns `Ok(None)` for requests that are not the OAuth2 redirect.
fn parse_callback_url(request_line: &str) -> AuthResult<Option<(String, String)>> {
    // Request line format: "GET /?code=xxx&state=yyy HTTP/1.1"
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(AuthError::AuthorizationFailed(
            "Invalid callback request".to_string(),
        ));
    }

    let path = parts[1];
    let url = url::Url::parse(&format!("http://localhost{}", path))
        .map_err(|e| AuthError::AuthorizationFailed(format!("Invalid callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => {
                let description = url
                    .query_pairs()
                    .find(|(k, _)| k == "error_description")
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_else(|| value.to_string());
                return Err(AuthError::AuthorizationFailed(description));
            }
            _ => {}
        }
    }

    match (code, state) {
        (Some(c), Some(s)) => Ok(Some((c, s))),
        (None, None) => Ok(None),
        _ => Err(AuthError::AuthorizationFailed(
            "Missing code or state in callback".to_string(),
        )),
    }
}

/// Send an HTTP response to the browser
fn send_http_response(stream: &mut TcpStream, title: &str, message: &str) {
    let body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{} - reportdrop</title>
    <style>
        body {{
            font-family: system-ui, sans-serif;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
            margin: 0;
        }}
    </style>
</head>
<body>
    <div>
        <h1>{}</h1>
        <p>{}</p>
    </div>
</body>
</html>"#,
        title, title, message
    );

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );

    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
