//! Identity provider seams
//!
//! [`IdentityProvider`] covers the account operations of the hosted identity
//! service. [`FederatedSignIn`] covers obtaining a third-party credential
//! (the "popup" part of provider sign-in) before it is exchanged for a session.

use super::types::{AuthResult, IdpCredential, Session, SessionUser, TokenSet};
use async_trait::async_trait;

/// Account operations of the identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Email/password sign-in
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session>;

    /// Create an email/password account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Session>;

    /// Set the display name of the account behind `id_token`
    async fn update_profile(&self, id_token: &str, display_name: &str) -> AuthResult<SessionUser>;

    /// Exchange a federated credential for a session
    async fn sign_in_with_idp(&self, credential: &IdpCredential) -> AuthResult<Session>;

    /// Send a password-reset email
    async fn send_password_reset(&self, email: &str) -> AuthResult<()>;

    /// Mint a fresh ID token from a refresh token
    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenSet>;

    /// Current profile of the account behind `id_token`
    async fn lookup(&self, id_token: &str) -> AuthResult<SessionUser>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Interactive acquisition of a federated credential
#[async_trait]
pub trait FederatedSignIn: Send + Sync {
    async fn obtain_credential(&self) -> AuthResult<IdpCredential>;

    /// Provider id as the identity provider knows it (e.g. `google.com`)
    fn provider_id(&self) -> &str;
}
