//! Session and API client wiring shared by all commands

use crate::error::Result;
use crate::output::{print_link, print_warning};
use parkinglot_common::AppConfig;
use parkinglot_sdk::auth::SessionManager;
use parkinglot_sdk::{ClientBuilder, LoginRedirect, ParkingLotClient};
use std::sync::Arc;
use tracing::warn;

pub const SESSION_EXPIRED_MESSAGE: &str =
    "Your session has expired. Run 'parkinglot login' to sign in again.";

/// Tells the terminal user to sign in again
pub struct TerminalRedirect;

impl LoginRedirect for TerminalRedirect {
    fn redirect(&self, _login_path: &str) {
        print_warning(SESSION_EXPIRED_MESSAGE);
    }
}

/// Everything a command handler needs
pub struct AppContext {
    pub config: AppConfig,
    pub session: Arc<SessionManager>,
    pub client: ParkingLotClient,
    pub json: bool,
}

impl AppContext {
    /// Build the Firebase-backed session from configuration and restore any
    /// persisted sign-in
    pub async fn from_config(config: AppConfig, json: bool) -> Result<Self> {
        let manager = SessionManager::from_config(&config, |flow| {
            flow.on_authorize_url(|url| print_link("Continue in your browser, or open", url))
        })?;
        Self::new(config, Arc::new(manager), json).await
    }

    /// Wire an existing session manager to an API client
    pub async fn new(config: AppConfig, session: Arc<SessionManager>, json: bool) -> Result<Self> {
        if let Err(e) = session.restore().await {
            warn!("Ignoring persisted session: {}", e);
        }

        let client = ClientBuilder::from_config(&config)
            .session(session.clone())
            .login_redirect(Arc::new(TerminalRedirect))
            .build()?;

        Ok(Self {
            config,
            session,
            client,
            json,
        })
    }
}
