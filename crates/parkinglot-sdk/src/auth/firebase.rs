//! Firebase Authentication over its REST API
//!
//! Account operations go to the Identity Toolkit API and token refresh to the
//! Secure Token API. Both base URLs can be overridden to target the auth
//! emulator or a mock server.

use super::provider::IdentityProvider;
use super::types::{AuthError, AuthResult, IdpCredential, Session, SessionUser, TokenSet};
use async_trait::async_trait;
use parkinglot_common::FirebaseConfig;
use reqwest::Response;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Identity Toolkit API base URL
pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Secure Token API base URL
pub const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Firebase-backed identity provider
pub struct FirebaseAuthProvider {
    http_client: reqwest::Client,
    api_key: String,
    identity_url: String,
    token_url: String,
}

impl FirebaseAuthProvider {
    /// Provider for the configured Firebase project
    pub fn new(config: &FirebaseConfig) -> AuthResult<Self> {
        Self::with_endpoints(&config.api_key, IDENTITY_TOOLKIT_URL, SECURE_TOKEN_URL)
    }

    /// Provider with explicit endpoints
    pub fn with_endpoints(
        api_key: impl Into<String>,
        identity_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> AuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            identity_url: identity_url.into().trim_end_matches('/').to_string(),
            token_url: token_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// POST to an Identity Toolkit `accounts:*` method
    async fn accounts<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> AuthResult<T> {
        let url = format!("{}/accounts:{}", self.identity_url, method);
        debug!("Calling identity provider method {}", method);

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> AuthResult<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| AuthError::Provider {
                    code: "INVALID_RESPONSE".to_string(),
                    message: format!("Unexpected identity provider response: {e}"),
                });
        }

        let text = response.text().await.unwrap_or_default();
        let code = serde_json::from_str::<FirebaseErrorBody>(&text)
            .map(|body| body.error.message)
            .unwrap_or_else(|_| format!("HTTP {}: {}", status.as_u16(), text.trim()));

        debug!("Identity provider returned {}: {}", status, code);
        Err(AuthError::from_provider_code(&code))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session> {
        let response: AccountResponse = self
            .accounts(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        response.into_session()
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Session> {
        let response: AccountResponse = self
            .accounts(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        response.into_session()
    }

    async fn update_profile(&self, id_token: &str, display_name: &str) -> AuthResult<SessionUser> {
        let response: AccountResponse = self
            .accounts(
                "update",
                &UpdateProfileRequest {
                    id_token,
                    display_name,
                    return_secure_token: false,
                },
            )
            .await?;
        Ok(response.user())
    }

    async fn sign_in_with_idp(&self, credential: &IdpCredential) -> AuthResult<Session> {
        let response: AccountResponse = self
            .accounts(
                "signInWithIdp",
                &IdpRequest {
                    post_body: credential.post_body(),
                    request_uri: &credential.request_uri,
                    return_idp_credential: true,
                    return_secure_token: true,
                },
            )
            .await?;

        if let Some(message) = &response.error_message {
            return Err(AuthError::from_provider_code(message));
        }
        response.into_session()
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        let _: serde_json::Value = self
            .accounts(
                "sendOobCode",
                &OobRequest {
                    request_type: "PASSWORD_RESET",
                    email,
                },
            )
            .await?;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenSet> {
        let url = format!("{}/token", self.token_url);
        debug!("Refreshing ID token");

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let refreshed: RefreshResponse = Self::handle_response(response).await?;
        Ok(TokenSet::new(
            refreshed.id_token,
            refreshed
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
            refreshed.expires_in.and_then(|s| s.parse().ok()),
        ))
    }

    async fn lookup(&self, id_token: &str) -> AuthResult<SessionUser> {
        let response: LookupResponse = self
            .accounts("lookup", &LookupRequest { id_token })
            .await?;

        response
            .users
            .into_iter()
            .next()
            .map(|account| account.user())
            .ok_or(AuthError::UserTokenExpired)
    }

    fn name(&self) -> &str {
        "firebase"
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobRequest<'a> {
    request_type: &'a str,
    email: &'a str,
}

/// Account payload shared by signIn/signUp/update/signInWithIdp responses
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default, alias = "profilePicture")]
    photo_url: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

impl AccountResponse {
    fn user(&self) -> SessionUser {
        SessionUser {
            uid: self.local_id.clone(),
            email: self.email.clone().filter(|e| !e.is_empty()),
            display_name: self.display_name.clone().filter(|n| !n.is_empty()),
            photo_url: self.photo_url.clone().filter(|p| !p.is_empty()),
        }
    }

    fn into_session(self) -> AuthResult<Session> {
        let user = self.user();
        let (Some(id_token), Some(refresh_token)) = (self.id_token, self.refresh_token) else {
            return Err(AuthError::Provider {
                code: "INVALID_RESPONSE".to_string(),
                message: "Identity provider response did not include tokens".to_string(),
            });
        };

        Ok(Session {
            user,
            tokens: TokenSet::new(
                id_token,
                refresh_token,
                self.expires_in.and_then(|s| s.parse().ok()),
            ),
        })
    }
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountResponse>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct FirebaseErrorBody {
    error: FirebaseErrorDetail,
}

#[derive(Deserialize)]
struct FirebaseErrorDetail {
    message: String,
}
