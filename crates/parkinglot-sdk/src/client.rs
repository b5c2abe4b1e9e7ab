//! HTTP client for the Ideas Parking Lot API
//!
//! # Authentication
//!
//! - The current session's ID token is sent as `Authorization: Bearer {token}`
//! - Requests go out unauthenticated when there is no session
//! - A 401 invalidates the session once per session generation and triggers
//!   the login redirect, then surfaces as [`ApiError::Unauthorized`]
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use parkinglot_sdk::auth::SessionManager;
//! use parkinglot_sdk::{ClientBuilder, IdeaQuery};
//! use parkinglot_common::AppConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None)?;
//! let session = Arc::new(SessionManager::from_config(&config, |flow| flow)?);
//! session.restore().await?;
//!
//! let client = ClientBuilder::from_config(&config)
//!     .session(session)
//!     .build()?;
//! let ideas = client.list_ideas(&IdeaQuery::default().category("Health")).await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    auth::{Anonymous, TokenSource},
    error::{ApiError, Result},
    public::{json_headers, PublicClient},
    redirect::{LogRedirect, LoginRedirect},
    types::{
        CategoriesResponse, IdeaQuery, IdeaResponse, IdeasResponse, MeResponse, MessageResponse,
        NewIdea, VerifyTokenRequest, VerifyTokenResponse,
    },
};
use parkinglot_common::config::{AppConfig, DEFAULT_API_URL};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout in seconds for API requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default login entry point
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// HTTP client for interacting with the Ideas Parking Lot API
pub struct ParkingLotClient {
    http_client: reqwest::Client,
    base_url: String,
    session: Arc<dyn TokenSource>,
    login_redirect: Arc<dyn LoginRedirect>,
    login_path: String,
    public: PublicClient,
}

impl ParkingLotClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ===== Auth =====

    /// Profile of the signed-in user
    pub async fn auth_me(&self) -> Result<MeResponse> {
        let request = self.http_client.get(self.url("/api/auth/me"));
        self.send(request).await
    }

    /// Ask the server to verify an ID token
    pub async fn verify_token(&self, token: &str) -> Result<VerifyTokenResponse> {
        let request = self
            .http_client
            .post(self.url("/api/auth/verify-token"))
            .json(&VerifyTokenRequest { token });
        self.send(request).await
    }

    // ===== Ideas =====

    /// List ideas, optionally filtered
    pub async fn list_ideas(&self, query: &IdeaQuery) -> Result<IdeasResponse> {
        let request = self.http_client.get(self.url("/api/ideas")).query(query);
        self.send(request).await
    }

    pub async fn get_idea(&self, id: &str) -> Result<IdeaResponse> {
        let request = self.http_client.get(self.idea_url(id));
        self.send(request).await
    }

    /// Ideas owned by the signed-in user
    pub async fn my_ideas(&self) -> Result<IdeasResponse> {
        let request = self.http_client.get(self.url("/api/ideas/user/my-ideas"));
        self.send(request).await
    }

    /// Create an idea. Invalid drafts are rejected without a request.
    pub async fn create_idea(&self, idea: &NewIdea) -> Result<IdeaResponse> {
        idea.validate()?;
        let request = self.http_client.post(self.url("/api/ideas")).json(idea);
        self.send(request).await
    }

    /// Replace an idea. Invalid drafts are rejected without a request.
    pub async fn update_idea(&self, id: &str, idea: &NewIdea) -> Result<IdeaResponse> {
        idea.validate()?;
        let request = self.http_client.put(self.idea_url(id)).json(idea);
        self.send(request).await
    }

    pub async fn delete_idea(&self, id: &str) -> Result<MessageResponse> {
        let request = self.http_client.delete(self.idea_url(id));
        self.send(request).await
    }

    // ===== Categories =====

    /// Public categories listing; see [`PublicClient::categories`]
    pub async fn categories(&self) -> CategoriesResponse {
        self.public.categories().await
    }

    // ===== Private Helper Methods =====

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn idea_url(&self, id: &str) -> String {
        self.url(&format!("/api/ideas/{}", urlencoding::encode(id)))
    }

    /// Attach the bearer credential (if any), send, and decode
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let credential = self.session.credential().await;
        let request = match &credential.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        debug!("{} {}", response.status(), response.url().path());
        self.handle_response(response, credential.generation).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        generation: u64,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_response(status, &body);

        if status == StatusCode::UNAUTHORIZED && self.session.invalidate(generation).await {
            info!("Request was unauthorized, session invalidated");
            self.login_redirect.redirect(&self.login_path);
        }

        Err(err)
    }
}

/// Builder for constructing a ParkingLotClient with custom configuration
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    session: Option<Arc<dyn TokenSource>>,
    login_redirect: Option<Arc<dyn LoginRedirect>>,
    login_path: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL, timeout and login path from application configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new()
            .base_url(&config.api.url)
            .timeout(config.request_timeout())
            .login_path(&config.auth.login_path)
    }

    /// Set the base URL for the API
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Credential source, normally an `Arc<SessionManager>`
    pub fn session(mut self, session: Arc<dyn TokenSource>) -> Self {
        self.session = Some(session);
        self
    }

    /// What to do after a 401 invalidated the session
    pub fn login_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.login_redirect = Some(redirect);
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ParkingLotClient> {
        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let parsed = url::Url::parse(&base_url).map_err(|e| ApiError::InvalidRequest {
            message: format!("Invalid base URL '{base_url}': {e}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidRequest {
                message: format!("Base URL must use http or https: {base_url}"),
            });
        }
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut http_builder = reqwest::Client::builder()
            .default_headers(json_headers())
            .timeout(
                self.timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            );
        if let Some(connect_timeout) = self.connect_timeout {
            http_builder = http_builder.connect_timeout(connect_timeout);
        }
        let http_client = http_builder.build().map_err(ApiError::HttpClient)?;

        Ok(ParkingLotClient {
            public: PublicClient::with_http_client(http_client.clone(), base_url.clone()),
            http_client,
            base_url,
            session: self.session.unwrap_or_else(|| Arc::new(Anonymous)),
            login_redirect: self.login_redirect.unwrap_or_else(|| Arc::new(LogRedirect)),
            login_path: self
                .login_path
                .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string()),
        })
    }
}
