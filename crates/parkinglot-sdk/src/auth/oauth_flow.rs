//! Google OAuth 2.0 authorization code flow with PKCE
//!
//! Produces the Google ID token that the identity provider exchanges for a
//! session through `signInWithIdp`.

use super::callback_server::CallbackServer;
use super::provider::FederatedSignIn;
use super::types::{AuthError, AuthResult, IdpCredential};
use async_trait::async_trait;
use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenUrl,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_PROVIDER_ID: &str = "google.com";

const SCOPES: [&str; 3] = ["openid", "profile", "email"];
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

type AuthorizeUrlHandler = Box<dyn Fn(&str) + Send + Sync>;

/// Browser-based Google sign-in
pub struct GoogleOAuthFlow {
    client_id: String,
    client_secret: Option<String>,
    auth_url: String,
    token_url: String,
    timeout: Duration,
    open_browser: bool,
    on_authorize_url: Option<AuthorizeUrlHandler>,
    http_client: reqwest::Client,
}

impl GoogleOAuthFlow {
    pub fn new(client_id: impl Into<String>, client_secret: Option<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            open_browser: true,
            on_authorize_url: None,
            http_client: reqwest::Client::new(),
        }
    }

    /// Override the authorization and token endpoints
    pub fn with_endpoints(mut self, auth_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self
    }

    /// How long to wait for the user to finish in the browser
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Called with the authorization URL before the browser is opened, so a
    /// terminal can print it for manual use
    pub fn on_authorize_url<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_authorize_url = Some(Box::new(handler));
        self
    }

    /// Skip launching the system browser
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    fn oauth_client(&self, redirect_uri: &str) -> AuthResult<BasicClient> {
        let auth_url = AuthUrl::new(self.auth_url.clone())
            .map_err(|e| AuthError::CallbackServer(format!("Invalid auth endpoint: {e}")))?;
        let token_url = TokenUrl::new(self.token_url.clone())
            .map_err(|e| AuthError::CallbackServer(format!("Invalid token endpoint: {e}")))?;
        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| AuthError::CallbackServer(format!("Invalid redirect URI: {e}")))?;

        Ok(BasicClient::new(
            ClientId::new(self.client_id.clone()),
            self.client_secret.clone().map(ClientSecret::new),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url))
    }

    /// Build the consent URL, returning it with the CSRF state and PKCE verifier
    fn authorize_url(&self, redirect_uri: &str) -> AuthResult<(String, CsrfToken, PkceCodeVerifier)> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let client = self.oauth_client(redirect_uri)?;
        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge)
            .add_extra_param("prompt", "select_account");
        for scope in SCOPES {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let (url, csrf_token) = request.url();
        Ok((url.to_string(), csrf_token, pkce_verifier))
    }

    /// Exchange the authorization code. `BasicTokenResponse` has no `id_token`
    /// field, so the token endpoint is called directly.
    async fn exchange_code(
        &self,
        code: &str,
        verifier: &PkceCodeVerifier,
        redirect_uri: &str,
    ) -> AuthResult<GoogleTokenResponse> {
        debug!("Exchanging authorization code for Google tokens");

        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("code_verifier", verifier.secret().as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let code = serde_json::from_str::<GoogleErrorResponse>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            return Err(AuthError::from_provider_code(&code));
        }

        serde_json::from_str(&text).map_err(|e| AuthError::Provider {
            code: "INVALID_RESPONSE".to_string(),
            message: format!("Unexpected token endpoint response: {e}"),
        })
    }
}

#[async_trait]
impl FederatedSignIn for GoogleOAuthFlow {
    async fn obtain_credential(&self) -> AuthResult<IdpCredential> {
        let server = CallbackServer::bind().await?;
        let redirect_uri = server.redirect_uri();
        let (auth_url, csrf_token, verifier) = self.authorize_url(&redirect_uri)?;

        if let Some(handler) = &self.on_authorize_url {
            handler(&auth_url);
        }
        if self.open_browser {
            webbrowser::open(&auth_url).map_err(|e| {
                debug!("Failed to open browser: {}", e);
                AuthError::PopupBlocked
            })?;
        }

        info!("Waiting for Google sign-in to complete in the browser");
        let code = server
            .wait_for_code(csrf_token.secret(), self.timeout)
            .await?;

        let tokens = self.exchange_code(&code, &verifier, &redirect_uri).await?;
        if tokens.id_token.is_none() && tokens.access_token.is_none() {
            return Err(AuthError::Provider {
                code: "INVALID_IDP_RESPONSE".to_string(),
                message: "Google did not return any token".to_string(),
            });
        }

        Ok(IdpCredential {
            provider_id: GOOGLE_PROVIDER_ID.to_string(),
            id_token: tokens.id_token,
            access_token: tokens.access_token,
            request_uri: redirect_uri,
        })
    }

    fn provider_id(&self) -> &str {
        GOOGLE_PROVIDER_ID
    }
}

#[derive(Deserialize)]
struct GoogleTokenResponse {
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct GoogleErrorResponse {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Plays the browser: follows the authorization URL's redirect_uri with
    /// the given query
    fn simulate_browser(extra_query: &'static str) -> impl Fn(&str) + Send + Sync + 'static {
        move |auth_url: &str| {
            let url = url::Url::parse(auth_url).unwrap();
            let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
            let redirect = format!(
                "{}?state={}&{}",
                params["redirect_uri"], params["state"], extra_query
            );
            tokio::spawn(async move {
                reqwest::get(redirect).await.unwrap();
            });
        }
    }

    #[test]
    fn test_authorize_url_parameters() {
        let flow = GoogleOAuthFlow::new("client-1", None);
        let (url, csrf, _) = flow
            .authorize_url("http://127.0.0.1:4000/callback")
            .unwrap();

        let parsed = url::Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client-1");
        assert_eq!(params["prompt"], "select_account");
        assert_eq!(params["scope"], "openid profile email");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["state"], *csrf.secret());
        assert_eq!(params["redirect_uri"], "http://127.0.0.1:4000/callback");
    }

    #[tokio::test]
    async fn test_obtains_google_id_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("code_verifier="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.token",
                "id_token": "google.id.token",
                "expires_in": 3599,
                "token_type": "Bearer",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let flow = GoogleOAuthFlow::new("client-1", Some("secret".into()))
            .with_endpoints(format!("{}/auth", server.uri()), format!("{}/token", server.uri()))
            .with_timeout(Duration::from_secs(5))
            .without_browser()
            .on_authorize_url(simulate_browser("code=the-code"));

        let credential = flow.obtain_credential().await.unwrap();
        assert_eq!(credential.provider_id, "google.com");
        assert_eq!(credential.id_token.as_deref(), Some("google.id.token"));
        assert!(credential.request_uri.starts_with("http://127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_consent_denied() {
        let flow = GoogleOAuthFlow::new("client-1", None)
            .with_timeout(Duration::from_secs(5))
            .without_browser()
            .on_authorize_url(simulate_browser("error=access_denied"));

        let err = flow.obtain_credential().await.unwrap_err();
        assert_eq!(err.code(), "auth/popup-closed-by-user");
    }
}
