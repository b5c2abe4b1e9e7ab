//! End-to-end behaviour of the session manager and request client against
//! mocked Firebase and API servers

use futures::future::join_all;
use futures::StreamExt;
use parkinglot_sdk::auth::{
    AuthState, FirebaseAuthProvider, GoogleOAuthFlow, MemorySessionStore, Session, SessionManager,
    SessionStore, SessionUser, TokenSet,
};
use parkinglot_sdk::{ApiError, ClientBuilder, IdeaQuery, NewIdea, ParkingLotClient, PublicClient};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests without an Authorization header
struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

fn firebase_provider(server: &MockServer) -> Arc<FirebaseAuthProvider> {
    Arc::new(
        FirebaseAuthProvider::with_endpoints(
            "test-key",
            format!("{}/identitytoolkit/v1", server.uri()),
            format!("{}/securetoken/v1", server.uri()),
        )
        .unwrap(),
    )
}

fn manager(server: &MockServer, store: Arc<MemorySessionStore>) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(firebase_provider(server), store))
}

async fn mount_password_sign_in(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/identitytoolkit/v1/accounts:signInWithPassword"))
        .and(body_string_contains("correct-horse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-1",
            "email": "ada@example.com",
            "displayName": "Ada",
            "idToken": "id-token-1",
            "refreshToken": "refresh-1",
            "expiresIn": "3600",
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/identitytoolkit/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "INVALID_LOGIN_CREDENTIALS"}
        })))
        .mount(server)
        .await;
}

async fn signed_in(server: &MockServer) -> Arc<SessionManager> {
    mount_password_sign_in(server).await;
    let manager = manager(server, Arc::new(MemorySessionStore::new()));
    manager
        .sign_in("ada@example.com", "correct-horse")
        .await
        .unwrap();
    manager
}

fn api_client(server: &MockServer, session: Arc<SessionManager>) -> ParkingLotClient {
    ClientBuilder::new()
        .base_url(server.uri())
        .session(session)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_request_without_token_has_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ideas"))
        .and(NoAuthorization)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "ideas": []})))
        .expect(1)
        .mount(&server)
        .await;

    let session = manager(&server, Arc::new(MemorySessionStore::new()));
    let client = api_client(&server, session);

    let response = client.list_ideas(&IdeaQuery::default()).await.unwrap();
    assert!(response.ideas.is_empty());
}

#[tokio::test]
async fn test_request_with_token_sends_bearer_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ideas/user/my-ideas"))
        .and(header("Authorization", "Bearer id-token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "ideas": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server, signed_in(&server).await);
    client.my_ideas().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_unauthorized_responses_sign_out_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/ideas/[^/]+$"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"success": false, "message": "Token expired"}))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let session = signed_in(&server).await;
    let mut subscription = session.subscribe().await;
    let redirects = Arc::new(AtomicUsize::new(0));
    let client = {
        let redirects = redirects.clone();
        ClientBuilder::new()
            .base_url(server.uri())
            .session(session.clone())
            .login_redirect(Arc::new(move |login_path: &str| {
                assert_eq!(login_path, "/login");
                redirects.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
            .unwrap()
    };

    let results = join_all((0..10).map(|i| {
        let client = &client;
        async move { client.get_idea(&i.to_string()).await }
    }))
    .await;

    assert!(results
        .iter()
        .all(|r| matches!(r, Err(ApiError::Unauthorized { message }) if message == "Token expired")));
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
    assert!(!session.is_authenticated().await);

    assert!(matches!(subscription.recv().await, Some(AuthState::SignedIn(_))));
    assert_eq!(subscription.recv().await, Some(AuthState::SignedOut));
    assert!(
        tokio::time::timeout(Duration::from_millis(50), subscription.recv())
            .await
            .is_err(),
        "only one sign-out transition expected"
    );
}

#[tokio::test]
async fn test_categories_never_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = PublicClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let response = client.categories().await;
    assert!(!response.success);
    assert!(response.categories.is_empty());
    assert_eq!(response.error.as_deref(), Some("Failed to fetch categories"));

    // Nothing listening at all
    let client = PublicClient::new("http://127.0.0.1:9", Duration::from_secs(5)).unwrap();
    let response = client.categories().await;
    assert!(!response.success);
    assert!(response.categories.is_empty());
}

#[tokio::test]
async fn test_invalid_credentials_fail_without_session() {
    let server = MockServer::start().await;
    mount_password_sign_in(&server).await;
    let store = Arc::new(MemorySessionStore::new());
    let manager = manager(&server, store.clone());

    let err = manager
        .sign_in("ada@example.com", "wrong-password")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "auth/invalid-credential");
    assert_eq!(err.to_string(), "Invalid email or password.");
    assert!(!manager.is_authenticated().await);
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_get_token_refreshes_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/securetoken/v1/token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "id_token": "id-token-2",
                    "refresh_token": "refresh-2",
                    "expires_in": "3600",
                    "user_id": "uid-1",
                }))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let expiring = Session {
        user: SessionUser {
            uid: "uid-1".into(),
            email: Some("ada@example.com".into()),
            display_name: Some("Ada".into()),
            photo_url: None,
        },
        tokens: TokenSet::new("id-token-1".into(), "refresh-1".into(), Some(60)),
    };
    let store = Arc::new(MemorySessionStore::with_session(expiring));
    let manager = manager(&server, store.clone());
    manager.restore().await.unwrap();

    let tokens = join_all((0..10).map(|_| manager.get_token())).await;
    assert!(tokens.iter().all(|t| t.as_deref() == Some("id-token-2")));

    let persisted = store.load().await.unwrap().unwrap();
    assert_eq!(persisted.tokens.refresh_token, "refresh-2");
}

#[tokio::test]
async fn test_invalid_draft_is_rejected_without_request() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = api_client(&server, manager(&server, Arc::new(MemorySessionStore::new())));
    let err = client
        .create_idea(&NewIdea {
            title: "Only a title".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    let ApiError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(
        errors.message_for("shortDescription"),
        Some("Short description is required")
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_subscription_sees_every_transition_in_order() {
    let server = MockServer::start().await;
    mount_password_sign_in(&server).await;
    let manager = manager(&server, Arc::new(MemorySessionStore::new()));

    let first = manager.subscribe().await;
    let mut second = manager.subscribe().await;

    manager.sign_in("ada@example.com", "correct-horse").await.unwrap();
    manager.sign_out().await.unwrap();
    manager.sign_in("ada@example.com", "correct-horse").await.unwrap();

    let states: Vec<AuthState> = first.into_stream().take(4).collect().await;
    let uids: Vec<Option<String>> = states
        .iter()
        .map(|s| s.user().map(|u| u.uid.clone()))
        .collect();
    assert_eq!(
        uids,
        vec![None, Some("uid-1".into()), None, Some("uid-1".into())]
    );

    assert_eq!(second.recv().await, Some(AuthState::SignedOut));
    drop(second);
    manager.sign_out().await.unwrap();
}

#[tokio::test]
async fn test_google_sign_in_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/google/token"))
        .and(body_string_contains("code=google-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.access",
            "id_token": "google-id-token",
            "expires_in": 3599,
            "token_type": "Bearer",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/identitytoolkit/v1/accounts:signInWithIdp"))
        .and(body_string_contains("providerId=google.com"))
        .and(body_string_contains("google-id-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "federatedId": "https://accounts.google.com/1234",
            "providerId": "google.com",
            "localId": "uid-google",
            "email": "grace@example.com",
            "displayName": "Grace Hopper",
            "photoUrl": "https://example.com/grace.png",
            "idToken": "firebase-id",
            "refreshToken": "firebase-refresh",
            "expiresIn": "3600",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let flow = GoogleOAuthFlow::new("client-1", None)
        .with_endpoints(
            format!("{}/google/auth", server.uri()),
            format!("{}/google/token", server.uri()),
        )
        .with_timeout(Duration::from_secs(5))
        .without_browser()
        .on_authorize_url(|auth_url: &str| {
            let url = url::Url::parse(auth_url).unwrap();
            let param = |name: &str| {
                url.query_pairs()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.into_owned())
                    .unwrap()
            };
            let redirect = format!(
                "{}?code=google-code&state={}",
                param("redirect_uri"),
                param("state")
            );
            tokio::spawn(async move {
                reqwest::get(redirect).await.unwrap();
            });
        });

    let manager = SessionManager::new(firebase_provider(&server), Arc::new(MemorySessionStore::new()))
        .with_federated_sign_in(Arc::new(flow));

    let user = manager.sign_in_with_provider().await.unwrap();
    assert_eq!(user.uid, "uid-google");
    assert_eq!(user.display_name.as_deref(), Some("Grace Hopper"));
    assert_eq!(manager.get_token().await.as_deref(), Some("firebase-id"));
}

#[tokio::test]
async fn test_second_google_sign_in_is_cancelled() {
    let server = MockServer::start().await;
    let started = Arc::new(Notify::new());

    let flow = {
        let started = started.clone();
        GoogleOAuthFlow::new("client-1", None)
            .with_timeout(Duration::from_secs(30))
            .without_browser()
            .on_authorize_url(move |_: &str| started.notify_one())
    };
    let manager = Arc::new(
        SessionManager::new(firebase_provider(&server), Arc::new(MemorySessionStore::new()))
            .with_federated_sign_in(Arc::new(flow)),
    );

    let first = tokio::spawn({
        let manager = manager.clone();
        async move { manager.sign_in_with_provider().await }
    });
    started.notified().await;

    let err = manager.sign_in_with_provider().await.unwrap_err();
    assert_eq!(err.code(), "auth/cancelled-popup-request");
    assert_eq!(
        err.to_string(),
        "Only one popup request is allowed at a time. Please try again."
    );

    first.abort();
}
