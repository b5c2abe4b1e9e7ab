//! Authentication and session management
//!
//! This module provides:
//! - Email/password, sign-up and Google sign-in against Firebase Authentication
//! - Session persistence with pluggable storage
//! - ID token refresh shared between concurrent callers
//! - Auth-state subscriptions
//! - The bearer credential seam used by the request client

pub mod callback_server;
pub mod firebase;
pub mod manager;
pub mod oauth_flow;
pub mod provider;
pub mod store;
pub mod token_source;
pub mod types;

pub use firebase::FirebaseAuthProvider;
pub use manager::{SessionManager, SessionSubscription};
pub use oauth_flow::GoogleOAuthFlow;
pub use provider::{FederatedSignIn, IdentityProvider};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use token_source::{Anonymous, Credential, TokenSource};
pub use types::{AuthError, AuthResult, AuthState, IdpCredential, Session, SessionUser, TokenSet};
