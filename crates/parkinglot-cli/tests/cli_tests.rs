//! Argument parsing and command handlers against mocked Firebase and API servers

use clap::Parser;
use parkinglot_cli::cli::handlers::dispatch;
use parkinglot_cli::cli::{Args, Commands, IdeaFields, IdeasAction, ListFilters};
use parkinglot_cli::context::AppContext;
use parkinglot_cli::CliError;
use parkinglot_common::AppConfig;
use parkinglot_sdk::auth::{
    AuthError, FirebaseAuthProvider, MemorySessionStore, Session, SessionManager, SessionStore,
    SessionUser, TokenSet,
};
use parkinglot_sdk::Priority;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session() -> Session {
    Session {
        user: SessionUser {
            uid: "uid-1".into(),
            email: Some("ada@example.com".into()),
            display_name: Some("Ada".into()),
            photo_url: None,
        },
        tokens: TokenSet::new("id-token-1".into(), "refresh-1".into(), Some(3600)),
    }
}

fn idea_json(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "shortDescription": "Boil water with sunlight",
        "fullDescription": "A parabolic mirror focuses light on the kettle.",
        "price": 25.0,
        "category": "Technology",
        "priority": "medium",
        "userId": "uid-1",
        "user": {"id": "uid-1", "name": "Ada", "email": "ada@example.com"}
    })
}

async fn context(
    server: &MockServer,
    store: Arc<MemorySessionStore>,
) -> AppContext {
    let provider = FirebaseAuthProvider::with_endpoints(
        "test-key",
        format!("{}/identitytoolkit/v1", server.uri()),
        format!("{}/securetoken/v1", server.uri()),
    )
    .unwrap();
    let manager = Arc::new(SessionManager::new(Arc::new(provider), store));

    let mut config = AppConfig::default();
    config.api.url = server.uri();

    AppContext::new(config, manager, true).await.unwrap()
}

async fn signed_in_context(server: &MockServer) -> (AppContext, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::with_session(session()));
    (context(server, store.clone()).await, store)
}

// ===== Argument parsing =====

#[test]
fn test_parse_ideas_add_flags() {
    let args = Args::try_parse_from([
        "parkinglot",
        "ideas",
        "add",
        "--title",
        "Solar kettle",
        "--short",
        "Boil water",
        "--price",
        "12.50",
        "--priority",
        "HIGH",
    ])
    .unwrap();

    match args.command {
        Commands::Ideas {
            action: IdeasAction::Add { fields },
        } => {
            assert_eq!(fields.title.as_deref(), Some("Solar kettle"));
            assert_eq!(fields.short_description.as_deref(), Some("Boil water"));
            assert_eq!(fields.full_description, None);
            assert_eq!(fields.price, Some(Decimal::from_str("12.50").unwrap()));
            assert_eq!(fields.priority, Some(Priority::High));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_parse_rejects_unknown_priority() {
    let result = Args::try_parse_from(["parkinglot", "ideas", "add", "--priority", "urgent"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_login_google_conflicts_with_email() {
    let result =
        Args::try_parse_from(["parkinglot", "login", "--google", "--email", "a@example.com"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_global_flags_after_subcommand() {
    let args =
        Args::try_parse_from(["parkinglot", "whoami", "--json", "--config", "custom.toml"]).unwrap();

    assert!(args.json);
    assert_eq!(args.config.as_deref(), Some(std::path::Path::new("custom.toml")));
    assert!(matches!(args.command, Commands::Whoami));
}

#[test]
fn test_parse_rm_with_yes() {
    let args = Args::try_parse_from(["parkinglot", "ideas", "rm", "abc", "-y"]).unwrap();
    match args.command {
        Commands::Ideas {
            action: IdeasAction::Rm { id, yes },
        } => {
            assert_eq!(id, "abc");
            assert!(yes);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[tokio::test]
async fn test_config_example_runs_without_configuration() {
    let args = Args::try_parse_from(["parkinglot", "config", "example"]).unwrap();
    args.run().await.unwrap();
}

// ===== Handlers =====

#[tokio::test]
async fn test_categories_failure_still_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db down"})))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, Arc::new(MemorySessionStore::new())).await;
    dispatch(&ctx, Commands::Categories).await.unwrap();
}

#[tokio::test]
async fn test_ideas_ls_passes_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ideas"))
        .and(wiremock::matchers::query_param("search", "kettle"))
        .and(wiremock::matchers::query_param("category", "Technology"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "ideas": [idea_json("a", "Solar kettle"), idea_json("b", "Wind kettle")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, Arc::new(MemorySessionStore::new())).await;
    let filters = ListFilters {
        search: Some("kettle".into()),
        category: Some("Technology".into()),
        limit: Some(1),
    };
    dispatch(&ctx, Commands::Ideas { action: IdeasAction::Ls { filters } })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ideas_add_sends_draft_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ideas"))
        .and(header("Authorization", "Bearer id-token-1"))
        .and(body_partial_json(json!({
            "title": "Solar kettle",
            "shortDescription": "Boil water with sunlight",
            "category": "Technology",
            "priority": "high",
            "price": 0.0
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"success": true, "idea": idea_json("new-1", "Solar kettle")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, _store) = signed_in_context(&server).await;
    let fields = IdeaFields {
        title: Some("Solar kettle".into()),
        short_description: Some("Boil water with sunlight".into()),
        full_description: Some("A parabolic mirror focuses light on the kettle.".into()),
        category: Some("Technology".into()),
        priority: Some(Priority::High),
        ..Default::default()
    };

    dispatch(&ctx, Commands::Ideas { action: IdeasAction::Add { fields } })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ideas_add_rejects_negative_price_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ideas"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let (ctx, _store) = signed_in_context(&server).await;
    let fields = IdeaFields {
        title: Some("Solar kettle".into()),
        short_description: Some("Short".into()),
        full_description: Some("Full".into()),
        category: Some("Technology".into()),
        price: Some(Decimal::from_str("-1").unwrap()),
        ..Default::default()
    };

    let err = dispatch(&ctx, Commands::Ideas { action: IdeasAction::Add { fields } })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Price must be a non-negative number");
}

#[tokio::test]
async fn test_ideas_update_overlays_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ideas/idea-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "idea": idea_json("idea-1", "Old title")})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/ideas/idea-1"))
        .and(body_partial_json(json!({
            "title": "New title",
            "category": "Technology",
            "price": 25.0
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "idea": idea_json("idea-1", "New title")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, _store) = signed_in_context(&server).await;
    let fields = IdeaFields {
        title: Some("New title".into()),
        ..Default::default()
    };

    dispatch(
        &ctx,
        Commands::Ideas {
            action: IdeasAction::Update {
                id: "idea-1".into(),
                fields,
            },
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_ideas_update_without_fields_fails() {
    let server = MockServer::start().await;
    let (ctx, _store) = signed_in_context(&server).await;

    let err = dispatch(
        &ctx,
        Commands::Ideas {
            action: IdeasAction::Update {
                id: "idea-1".into(),
                fields: IdeaFields::default(),
            },
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "Nothing to update");
    assert!(err.suggestion().is_some());
}

#[tokio::test]
async fn test_ideas_rm_with_yes_deletes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/ideas/idea-1"))
        .and(header("Authorization", "Bearer id-token-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "message": "Idea deleted successfully"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, _store) = signed_in_context(&server).await;
    dispatch(
        &ctx,
        Commands::Ideas {
            action: IdeasAction::Rm {
                id: "idea-1".into(),
                yes: true,
            },
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_mine_requires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ideas/user/my-ideas"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = context(&server, Arc::new(MemorySessionStore::new())).await;
    let err = dispatch(&ctx, Commands::Ideas { action: IdeasAction::Mine })
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::Auth(AuthError::UserNotLoggedIn)));
}

#[tokio::test]
async fn test_unauthorized_response_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ideas/user/my-ideas"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, store) = signed_in_context(&server).await;
    let err = dispatch(&ctx, Commands::Ideas { action: IdeasAction::Mine })
        .await
        .unwrap_err();

    assert!(err.suggestion().is_some());
    assert!(!ctx.session.is_authenticated().await);
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_whoami_falls_back_to_session_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, _store) = signed_in_context(&server).await;
    dispatch(&ctx, Commands::Whoami).await.unwrap();
}

#[tokio::test]
async fn test_logout_clears_stored_session() {
    let server = MockServer::start().await;
    let (ctx, store) = signed_in_context(&server).await;

    dispatch(&ctx, Commands::Logout).await.unwrap();
    assert!(!ctx.session.is_authenticated().await);
    assert!(store.load().await.unwrap().is_none());

    // Second logout reports instead of failing
    dispatch(&ctx, Commands::Logout).await.unwrap();
}

#[tokio::test]
async fn test_reset_password_reports_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identitytoolkit/v1/accounts:sendOobCode"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "INVALID_EMAIL"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, Arc::new(MemorySessionStore::new())).await;
    let err = dispatch(
        &ctx,
        Commands::ResetPassword {
            email: Some("not-an-email".into()),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CliError::Auth(AuthError::InvalidEmail)));
}
