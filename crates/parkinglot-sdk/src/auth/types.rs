//! Session and error types for the auth module

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use etcetera::{choose_base_strategy, BaseStrategy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Default lifetime assumed when the provider does not report one
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Profile of the signed-in user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Provider user identifier
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Avatar URL
    pub photo_url: Option<String>,
}

impl SessionUser {
    /// Name to show for this user: display name, else email local part, else "User"
    pub fn preferred_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("User")
            .to_string()
    }
}

/// Token material for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Short-lived ID token presented as the bearer credential
    pub id_token: String,
    /// Long-lived token used to mint new ID tokens
    pub refresh_token: String,
    /// ID token expiration as Unix timestamp
    pub expires_at: u64,
}

impl TokenSet {
    /// Create a token set. Without `expires_in` the JWT `exp` claim is used,
    /// falling back to the provider's default one-hour lifetime.
    pub fn new(id_token: String, refresh_token: String, expires_in: Option<u64>) -> Self {
        let expires_at = match expires_in {
            Some(seconds) => now_secs() + seconds,
            None => Self::decode_jwt_exp(&id_token)
                .unwrap_or_else(|| now_secs() + DEFAULT_TOKEN_LIFETIME_SECS),
        };

        Self {
            id_token,
            refresh_token,
            expires_at,
        }
    }

    /// Extract the `exp` claim from a JWT without verifying it
    fn decode_jwt_exp(token: &str) -> Option<u64> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        let payload = parts[1].trim_end_matches('=');
        let decoded = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
        let json: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
        json.get("exp")?.as_u64()
    }

    /// Check if the ID token is expired
    pub fn is_expired(&self) -> bool {
        now_secs() >= self.expires_at
    }

    /// Check if the ID token expires within the given duration
    pub fn expires_within(&self, duration: Duration) -> bool {
        self.expires_at <= now_secs() + duration.as_secs()
    }

    /// Time until the ID token expires (zero if already expired)
    pub fn time_until_expiry(&self) -> Duration {
        Duration::from_secs(self.expires_at.saturating_sub(now_secs()))
    }
}

/// An authenticated user's credential state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub tokens: TokenSet,
}

/// Auth state delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedIn(SessionUser),
    SignedOut,
}

impl AuthState {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            AuthState::SignedOut => None,
        }
    }
}

/// Credential obtained from a federated identity provider (e.g. Google)
#[derive(Debug, Clone)]
pub struct IdpCredential {
    /// Provider id as the identity provider knows it (`google.com`)
    pub provider_id: String,
    pub id_token: Option<String>,
    pub access_token: Option<String>,
    /// Redirect URI the credential was issued for
    pub request_uri: String,
}

impl IdpCredential {
    /// Encode as the form body the identity provider expects
    pub fn post_body(&self) -> String {
        let mut body = format!("providerId={}", urlencoding::encode(&self.provider_id));
        if let Some(id_token) = &self.id_token {
            body.push_str(&format!("&id_token={}", urlencoding::encode(id_token)));
        }
        if let Some(access_token) = &self.access_token {
            body.push_str(&format!("&access_token={}", urlencoding::encode(access_token)));
        }
        body
    }
}

/// Authentication errors
///
/// `Display` is the user-facing message; [`AuthError::code`] is the stable
/// provider-style code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password.")]
    InvalidCredential,

    #[error("This account has been disabled.")]
    UserDisabled,

    #[error("An account with this email already exists.")]
    EmailAlreadyInUse,

    #[error("Password should be at least 6 characters.")]
    WeakPassword,

    #[error("The email address is badly formatted.")]
    InvalidEmail,

    #[error("A password is required.")]
    MissingPassword,

    #[error("Too many attempts. Please try again later.")]
    TooManyRequests,

    #[error("Google sign-in is not enabled. Please contact support.")]
    OperationNotAllowed,

    #[error("Sign-in popup was closed. Please try again.")]
    PopupClosedByUser,

    #[error("Popup was blocked by your browser. Please allow popups for this site.")]
    PopupBlocked,

    #[error("Only one popup request is allowed at a time. Please try again.")]
    CancelledPopupRequest,

    #[error("This domain is not authorized for Google sign-in. Please contact support.")]
    UnauthorizedDomain,

    #[error("Your session has expired. Please sign in again.")]
    UserTokenExpired,

    #[error("The identity provider rejected the configured API key.")]
    InvalidApiKey,

    #[error("Sign-in timed out. Please try again.")]
    Timeout,

    #[error("User not logged in. Run 'parkinglot login' to authenticate")]
    UserNotLoggedIn,

    #[error("Network error while contacting the identity provider: {0}")]
    Network(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Callback server error: {0}")]
    CallbackServer(String),

    #[error("{message}")]
    Provider { code: String, message: String },
}

impl AuthError {
    /// Map an identity provider error code (e.g. `EMAIL_NOT_FOUND` or
    /// `WEAK_PASSWORD : Password should be at least 6 characters`).
    pub fn from_provider_code(raw: &str) -> Self {
        let code = raw
            .split(" : ")
            .next()
            .unwrap_or(raw)
            .trim();

        match code {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                AuthError::InvalidCredential
            }
            "USER_DISABLED" => AuthError::UserDisabled,
            "EMAIL_EXISTS" => AuthError::EmailAlreadyInUse,
            "WEAK_PASSWORD" => AuthError::WeakPassword,
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
            "MISSING_PASSWORD" => AuthError::MissingPassword,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyRequests,
            "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => AuthError::OperationNotAllowed,
            "UNAUTHORIZED_DOMAIN" | "INVALID_IDP_RESPONSE" | "redirect_uri_mismatch" => {
                AuthError::UnauthorizedDomain
            }
            "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" | "INVALID_ID_TOKEN"
            | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => AuthError::UserTokenExpired,
            "access_denied" => AuthError::PopupClosedByUser,
            "invalid_client" | "unauthorized_client" => AuthError::OperationNotAllowed,
            _ if code.starts_with("API key not valid") || code == "INVALID_API_KEY" => {
                AuthError::InvalidApiKey
            }
            _ => AuthError::Provider {
                code: code.to_string(),
                message: if raw.trim().is_empty() {
                    "Authentication failed".to_string()
                } else {
                    raw.trim().to_string()
                },
            },
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredential => "auth/invalid-credential",
            AuthError::UserDisabled => "auth/user-disabled",
            AuthError::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthError::WeakPassword => "auth/weak-password",
            AuthError::InvalidEmail => "auth/invalid-email",
            AuthError::MissingPassword => "auth/missing-password",
            AuthError::TooManyRequests => "auth/too-many-requests",
            AuthError::OperationNotAllowed => "auth/operation-not-allowed",
            AuthError::PopupClosedByUser => "auth/popup-closed-by-user",
            AuthError::PopupBlocked => "auth/popup-blocked",
            AuthError::CancelledPopupRequest => "auth/cancelled-popup-request",
            AuthError::UnauthorizedDomain => "auth/unauthorized-domain",
            AuthError::UserTokenExpired => "auth/user-token-expired",
            AuthError::InvalidApiKey => "auth/invalid-api-key",
            AuthError::Timeout => "auth/timeout",
            AuthError::UserNotLoggedIn => "auth/no-current-user",
            AuthError::Network(_) => "auth/network-request-failed",
            AuthError::Storage(_) => "auth/storage-error",
            AuthError::CallbackServer(_) => "auth/callback-server-error",
            AuthError::Provider { .. } => "auth/internal-error",
        }
    }

    /// The refresh token can no longer be used; the session must end
    pub fn is_session_revoked(&self) -> bool {
        matches!(self, AuthError::UserTokenExpired | AuthError::UserDisabled)
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Network(err.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::Storage(err.to_string())
    }
}

/// Platform data directory for persisted sessions (e.g. ~/.local/share/parkinglot)
pub fn default_data_dir() -> AuthResult<PathBuf> {
    let strategy = choose_base_strategy().map_err(|e| {
        AuthError::Storage(format!("Failed to determine base directories: {}", e))
    })?;
    Ok(strategy.data_dir().join("parkinglot"))
}
