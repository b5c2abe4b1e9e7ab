//! Session lifecycle with token refresh and auth-state fan-out
//!
//! The [`SessionManager`] owns the current session. It is meant to be held in
//! an `Arc` and shared between the request client and whatever surface drives
//! sign-in. Every sign-in or sign-out bumps the session generation, which is
//! what lets concurrent 401s invalidate the session exactly once.

use super::firebase::FirebaseAuthProvider;
use super::oauth_flow::GoogleOAuthFlow;
use super::provider::{FederatedSignIn, IdentityProvider};
use super::store::{FileSessionStore, SessionStore};
use super::token_source::{Credential, TokenSource};
use super::types::{AuthError, AuthResult, AuthState, Session, SessionUser};
use async_trait::async_trait;
use futures::Stream;
use parkinglot_common::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Capacity of the auth-state channel; slower subscribers skip ahead
const EVENT_CAPACITY: usize = 64;

#[derive(Default)]
struct SessionState {
    session: Option<Session>,
    generation: u64,
}

/// Explicit session context
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn SessionStore>,
    federated: Option<Arc<dyn FederatedSignIn>>,
    state: RwLock<SessionState>,
    refresh_lock: Mutex<()>,
    popup_lock: Mutex<()>,
    events: broadcast::Sender<AuthState>,
}

impl SessionManager {
    /// Refresh the ID token when it expires within this window
    pub const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            provider,
            store,
            federated: None,
            state: RwLock::new(SessionState::default()),
            refresh_lock: Mutex::new(()),
            popup_lock: Mutex::new(()),
            events,
        }
    }

    /// Enable provider sign-in through the given federated flow
    pub fn with_federated_sign_in(mut self, federated: Arc<dyn FederatedSignIn>) -> Self {
        self.federated = Some(federated);
        self
    }

    /// Firebase provider, file-backed store in the platform data directory and
    /// Google sign-in when an OAuth client is configured. `configure_google`
    /// can adjust the Google flow, e.g. to print the consent URL.
    pub fn from_config<F>(config: &AppConfig, configure_google: F) -> AuthResult<Self>
    where
        F: FnOnce(GoogleOAuthFlow) -> GoogleOAuthFlow,
    {
        let provider = Arc::new(FirebaseAuthProvider::new(&config.firebase)?);
        let store = Arc::new(FileSessionStore::default_location()?);
        let manager = Self::new(provider, store);

        Ok(match config.google_client_id() {
            Some(client_id) => {
                let secret = config
                    .oauth
                    .google_client_secret
                    .clone()
                    .filter(|s| !s.trim().is_empty());
                let flow = configure_google(GoogleOAuthFlow::new(client_id, secret));
                manager.with_federated_sign_in(Arc::new(flow))
            }
            None => manager,
        })
    }

    /// Reload the persisted session, if any
    pub async fn restore(&self) -> AuthResult<Option<SessionUser>> {
        let Some(session) = self.store.load().await? else {
            return Ok(None);
        };

        let user = session.user.clone();
        debug!("Restored session for user {}", user.uid);
        self.replace_session(Some(session)).await;
        Ok(Some(user))
    }

    /// Email/password sign-in
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<SessionUser> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        self.establish(session).await
    }

    /// Create an account and sign it in. A non-blank `name` becomes the
    /// display name; failing to set it does not fail the registration.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AuthResult<SessionUser> {
        let mut session = self.provider.sign_up(email, password).await?;

        let name = name.trim();
        if !name.is_empty() {
            match self
                .provider
                .update_profile(&session.tokens.id_token, name)
                .await
            {
                Ok(updated) => {
                    session.user.display_name =
                        updated.display_name.or_else(|| Some(name.to_string()));
                }
                Err(e) => warn!("Account created but setting the display name failed: {}", e),
            }
        }

        self.establish(session).await
    }

    /// Federated (Google) sign-in. Only one may run at a time.
    pub async fn sign_in_with_provider(&self) -> AuthResult<SessionUser> {
        let federated = self
            .federated
            .as_ref()
            .ok_or(AuthError::OperationNotAllowed)?;
        let _popup = self
            .popup_lock
            .try_lock()
            .map_err(|_| AuthError::CancelledPopupRequest)?;

        info!("Starting {} sign-in", federated.provider_id());
        let credential = federated.obtain_credential().await?;
        let session = self.provider.sign_in_with_idp(&credential).await?;
        self.establish(session).await
    }

    /// Sign out locally. Signing out without a session is a no-op.
    pub async fn sign_out(&self) -> AuthResult<()> {
        let had_session = self.replace_session(None).await;
        self.store.clear().await?;
        if had_session {
            info!("Signed out");
        }
        Ok(())
    }

    pub async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        self.provider.send_password_reset(email).await?;
        info!("Password reset email requested");
        Ok(())
    }

    /// Current ID token, refreshed if close to expiry. `None` when signed out
    /// or when the token cannot be obtained; failures are logged, not raised.
    pub async fn get_token(&self) -> Option<String> {
        TokenSource::credential(self).await.token
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.state.read().await.session.clone()
    }

    pub async fn current_user(&self) -> Option<SessionUser> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.session.is_some()
    }

    /// Re-read the user's profile from the identity provider
    pub async fn reload_user(&self) -> AuthResult<SessionUser> {
        let credential = TokenSource::credential(self).await;
        let token = credential.token.ok_or(AuthError::UserNotLoggedIn)?;
        let user = self.provider.lookup(&token).await?;

        let updated = {
            let mut state = self.state.write().await;
            if state.generation != credential.generation {
                None
            } else {
                state.session.as_mut().map(|session| {
                    session.user = user.clone();
                    session.clone()
                })
            }
        };
        if let Some(session) = updated {
            self.persist(&session).await;
        }
        Ok(user)
    }

    /// Subscribe to auth-state changes. The current state is yielded first.
    pub async fn subscribe(&self) -> SessionSubscription {
        // Subscribing under the read lock orders the snapshot before any
        // transition, since transitions are published under the write lock.
        let state = self.state.read().await;
        let receiver = self.events.subscribe();
        let initial = match &state.session {
            Some(session) => AuthState::SignedIn(session.user.clone()),
            None => AuthState::SignedOut,
        };

        SessionSubscription {
            initial: Some(initial),
            receiver,
        }
    }

    async fn establish(&self, session: Session) -> AuthResult<SessionUser> {
        self.store.save(&session).await?;
        let user = session.user.clone();
        self.replace_session(Some(session)).await;
        info!("Signed in as {}", user.uid);
        Ok(user)
    }

    /// Swap the session, bump the generation and publish the transition.
    /// Returns whether a session was present before.
    async fn replace_session(&self, session: Option<Session>) -> bool {
        let mut state = self.state.write().await;
        let had_session = state.session.is_some();
        let event = match &session {
            Some(s) => Some(AuthState::SignedIn(s.user.clone())),
            None if had_session => Some(AuthState::SignedOut),
            None => None,
        };

        state.session = session;
        state.generation += 1;
        if let Some(event) = event {
            // No receivers is fine
            let _ = self.events.send(event);
        }
        had_session
    }

    async fn persist(&self, session: &Session) {
        if let Err(e) = self.store.save(session).await {
            warn!("Failed to persist session: {}", e);
        }
    }

    async fn refresh(&self, generation: u64) -> Credential {
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed or ended the session meanwhile
        let (refresh_token, current_token) = {
            let state = self.state.read().await;
            match &state.session {
                Some(session) if state.generation == generation => {
                    if !session.tokens.expires_within(Self::REFRESH_MARGIN) {
                        return Credential {
                            token: Some(session.tokens.id_token.clone()),
                            generation,
                        };
                    }
                    let usable = (!session.tokens.is_expired()).then(|| session.tokens.id_token.clone());
                    (session.tokens.refresh_token.clone(), usable)
                }
                _ => return Self::snapshot(&state),
            }
        };

        debug!("ID token expiring, refreshing with {}", self.provider.name());
        match self.provider.refresh(&refresh_token).await {
            Ok(tokens) => {
                let updated = {
                    let mut state = self.state.write().await;
                    if state.generation != generation {
                        return Self::snapshot(&state);
                    }
                    state.session.as_mut().map(|session| {
                        session.tokens = tokens;
                        session.clone()
                    })
                };

                match updated {
                    Some(session) => {
                        debug!("ID token refreshed");
                        self.persist(&session).await;
                        Credential {
                            token: Some(session.tokens.id_token),
                            generation,
                        }
                    }
                    None => Credential {
                        token: None,
                        generation,
                    },
                }
            }
            Err(e) if e.is_session_revoked() => {
                warn!("Session is no longer valid ({}), signing out", e.code());
                self.invalidate(generation).await;
                Credential {
                    token: None,
                    generation: generation + 1,
                }
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                Credential {
                    token: current_token,
                    generation,
                }
            }
        }
    }

    fn snapshot(state: &SessionState) -> Credential {
        Credential {
            token: state.session.as_ref().map(|s| s.tokens.id_token.clone()),
            generation: state.generation,
        }
    }
}

#[async_trait]
impl TokenSource for SessionManager {
    async fn credential(&self) -> Credential {
        let generation = {
            let state = self.state.read().await;
            match &state.session {
                Some(session) if !session.tokens.expires_within(Self::REFRESH_MARGIN) => {
                    return Self::snapshot(&state);
                }
                Some(_) => state.generation,
                None => return Self::snapshot(&state),
            }
        };

        self.refresh(generation).await
    }

    async fn invalidate(&self, generation: u64) -> bool {
        let had_session = {
            let mut state = self.state.write().await;
            if state.generation != generation {
                debug!("Session already invalidated for generation {}", generation);
                return false;
            }

            let had_session = state.session.take().is_some();
            state.generation += 1;
            if had_session {
                let _ = self.events.send(AuthState::SignedOut);
            }
            had_session
        };

        if had_session {
            if let Err(e) = self.store.clear().await {
                warn!("Failed to clear persisted session: {}", e);
            }
            info!("Session invalidated");
        }
        true
    }
}

/// Stream of auth-state changes. Dropping it unsubscribes.
pub struct SessionSubscription {
    initial: Option<AuthState>,
    receiver: broadcast::Receiver<AuthState>,
}

impl SessionSubscription {
    /// Next auth state. `None` once the session manager is gone.
    pub async fn recv(&mut self) -> Option<AuthState> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }

        loop {
            match self.receiver.recv().await {
                Ok(state) => return Some(state),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Auth state subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}

    pub fn into_stream(self) -> impl Stream<Item = AuthState> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|state| (state, subscription))
        })
    }
}
