//! Loopback HTTP server receiving the OAuth authorization redirect
//!
//! The listener is bound before the browser is opened so the redirect URI
//! carries the real port.

use super::types::{AuthError, AuthResult};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Query parameters of the authorization redirect
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

type CallbackResult = AuthResult<String>;

struct CallbackState {
    sender: Mutex<Option<oneshot::Sender<CallbackResult>>>,
    expected_state: String,
}

impl CallbackState {
    /// Deliver the first outcome; later requests are ignored
    fn deliver(&self, result: CallbackResult) {
        let sender = self.sender.lock().ok().and_then(|mut guard| guard.take());
        if let Some(sender) = sender {
            let _ = sender.send(result);
        }
    }
}

/// Single-use local server for one authorization round trip
pub struct CallbackServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl CallbackServer {
    /// Bind an ephemeral port on 127.0.0.1
    pub async fn bind() -> AuthResult<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| AuthError::CallbackServer(format!("Failed to bind callback port: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| AuthError::CallbackServer(e.to_string()))?;

        Ok(Self { listener, addr })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Redirect URI to register with the authorization request
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/callback", self.port())
    }

    /// Serve until the redirect arrives or `timeout` elapses, returning the
    /// authorization code
    pub async fn wait_for_code(self, expected_state: &str, timeout: Duration) -> AuthResult<String> {
        let (tx, rx) = oneshot::channel();
        let state = Arc::new(CallbackState {
            sender: Mutex::new(Some(tx)),
            expected_state: expected_state.to_string(),
        });

        let app = Router::new()
            .route("/callback", get(handle_callback))
            .with_state(state);

        debug!("OAuth callback server listening on http://{}", self.addr);

        let listener = self.listener;
        let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

        let result = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(AuthError::CallbackServer(
                "Callback channel closed unexpectedly".to_string(),
            )),
            Err(_) => Err(AuthError::Timeout),
        };

        server_handle.abort();
        result
    }
}

async fn handle_callback(
    Query(params): Query<CallbackQuery>,
    State(state): State<Arc<CallbackState>>,
) -> impl IntoResponse {
    let outcome = if let Some(error) = params.error.as_deref() {
        warn!("Authorization failed: {}", error);
        Err(AuthError::from_provider_code(error))
    } else if params.state.as_deref() != Some(state.expected_state.as_str()) {
        Err(AuthError::CallbackServer(
            "State mismatch in authorization response".to_string(),
        ))
    } else {
        match params.code {
            Some(code) if !code.is_empty() => Ok(code),
            _ => Err(AuthError::CallbackServer(
                "Missing authorization code".to_string(),
            )),
        }
    };

    let page = match &outcome {
        Ok(_) => success_page(),
        Err(err) => {
            let detail = params
                .error_description
                .clone()
                .unwrap_or_else(|| err.to_string());
            error_page(&detail)
        }
    };

    state.deliver(outcome);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Html(page),
    )
}

const PAGE_STYLE: &str = "font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; \
     display: flex; justify-content: center; align-items: center; min-height: 100vh; margin: 0;";

fn success_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Signed in</title></head>
<body style="{PAGE_STYLE}">
  <div style="text-align: center">
    <h1>You're signed in to Ideas Parking Lot</h1>
    <p>You can close this window and return to the terminal.</p>
  </div>
</body>
</html>"#
    )
}

fn error_page(detail: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Sign-in failed</title></head>
<body style="{PAGE_STYLE}">
  <div style="text-align: center">
    <h1>Sign-in failed</h1>
    <p><code>{}</code></p>
    <p>Close this window and try again from the terminal.</p>
  </div>
</body>
</html>"#,
        escape_html(detail)
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
