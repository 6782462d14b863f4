//! Integration tests: register, login, logout and the revocation gate over HTTP.
//!
//! Run with `cargo test`. The in-memory tests always run. The Postgres test
//! needs `TEST_DATABASE_URL` (migrations are applied automatically).

use axum::body::Body;
use axum::http::{header::AUTHORIZATION, Request, StatusCode};
use axum::Router;
use sessiond::auth::TokenCodec;
use sessiond::models::NewUser;
use sessiond::repositories::{MemoryRepository, PgRepository, RevocationStore, UserStore};
use sessiond::{create_app, db, AppError, AppState, AuthConfig, SessionService};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

const JWT_SECRET: &str = "test-jwt-secret-min-32-chars!!!!";

fn test_config() -> AuthConfig {
    AuthConfig::new(JWT_SECRET).with_hash_cost(1)
}

fn memory_app() -> (Router, SessionService) {
    let repo = Arc::new(MemoryRepository::new());
    let sessions = SessionService::from_config(repo.clone(), repo, &test_config()).unwrap();
    (create_app(AppState::new(sessions.clone())), sessions)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(json) => req
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Walks the full lifecycle against whatever store backs `app`.
async fn alice_scenario(app: &Router, sessions: &SessionService, suffix: &str) {
    let username = format!("alice{}", suffix);
    let email = format!("alice{}@x.com", suffix);

    let register =
        serde_json::json!({ "username": username, "email": email, "password": "pw123" });
    let (status, body) = send(app, "POST", "/register", Some(register.clone()), None).await;
    assert_eq!(status, StatusCode::CREATED, "register should succeed: {}", body);
    assert_eq!(body["message"], "User created successfully");
    assert!(!body.to_string().contains("pw123"));
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = send(app, "POST", "/register", Some(register), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username or email already exists");

    let login = serde_json::json!({ "email": email, "password": "pw123" });
    let (status, body) = send(app, "POST", "/login", Some(login), None).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("response should contain token").to_string();

    let claims = sessions.tokens().verify(&token, chrono::Utc::now()).unwrap();
    assert_eq!(claims.email, email);

    let wrong = serde_json::json!({ "email": email, "password": "wrong" });
    let (status, wrong_body) = send(app, "POST", "/login", Some(wrong), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let unknown = serde_json::json!({
        "email": format!("nobody{}@x.com", suffix),
        "password": "pw123",
    });
    let (status, unknown_body) = send(app, "POST", "/login", Some(unknown), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"], "Invalid email or password");

    let (status, body) = send(app, "GET", "/profile", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Welcome {}", email));

    let (status, _) = send(app, "POST", "/logout", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(app, "POST", "/logout", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK, "second logout is idempotent");
    assert_eq!(body["message"], "Successfully logged out");

    let (status, body) = send(app, "GET", "/profile", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token has been revoked");
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _) = memory_app();
    let (status, json) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("ok"));
}

#[tokio::test]
async fn full_session_lifecycle_in_memory() {
    let (app, sessions) = memory_app();
    alice_scenario(&app, &sessions, "").await;
}

#[tokio::test]
async fn register_rejects_bad_payloads() {
    let (app, _) = memory_app();

    let (status, _) = send(
        &app,
        "POST",
        "/register",
        Some(serde_json::json!({ "email": "a@b.co", "password": "pw" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "username is required");

    let (status, _) = send(
        &app,
        "POST",
        "/register",
        Some(serde_json::json!({ "username": "a", "email": "nope", "password": "pw" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("POST")
        .uri("/register")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_requires_authorization_header() {
    let (app, _) = memory_app();
    let (status, _) = send(&app, "POST", "/logout", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/logout", None, Some("not.a.token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_rejects_token_signed_with_another_key() {
    let repo = Arc::new(MemoryRepository::new());
    let sessions = SessionService::from_config(repo.clone(), repo.clone(), &test_config()).unwrap();
    let app = create_app(AppState::new(sessions));

    let forger = TokenCodec::new(&AuthConfig::new("another-secret-that-is-long-enough!!"));
    let forged = forger
        .issue(uuid::Uuid::new_v4(), "eve@x.com", chrono::Utc::now())
        .unwrap();
    let (status, body) = send(&app, "POST", "/logout", None, Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
    assert_eq!(repo.revoked_count().await, 0);
}

#[tokio::test]
async fn profile_rejects_missing_forged_and_expired_tokens() {
    let (app, sessions) = memory_app();

    let (status, _) = send(&app, "GET", "/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forger = SessionService::from_config(
        Arc::new(MemoryRepository::new()),
        Arc::new(MemoryRepository::new()),
        &AuthConfig::new("another-secret-that-is-long-enough!!").with_hash_cost(1),
    )
    .unwrap();
    let forged = forger
        .tokens()
        .issue(uuid::Uuid::new_v4(), "eve@x.com", chrono::Utc::now())
        .unwrap();
    let (status, body) = send(&app, "GET", "/profile", None, Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");

    let expired = sessions
        .tokens()
        .issue(
            uuid::Uuid::new_v4(),
            "old@x.com",
            chrono::Utc::now() - chrono::Duration::hours(73),
        )
        .unwrap();
    let (status, _) = send(&app, "GET", "/profile", None, Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn full_session_lifecycle_postgres() {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => {
            eprintln!("Skip integration test: set TEST_DATABASE_URL");
            return;
        }
    };
    let pool = match db::create_pool(&database_url, 5, Duration::from_secs(5)).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Skip integration test: {}", e);
            return;
        }
    };
    db::run_migrations(&pool).await.unwrap();

    let repo = Arc::new(PgRepository::new(pool, Duration::from_secs(5)));
    let sessions = SessionService::from_config(repo.clone(), repo.clone(), &test_config()).unwrap();
    let app = create_app(AppState::new(sessions.clone()));

    let suffix = format!(
        "-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis()
    );
    alice_scenario(&app, &sessions, &suffix).await;

    // Concurrent duplicate revocations all succeed and leave one row.
    let stale = format!("stale-token{}", suffix);
    let expired_at = chrono::Utc::now() - chrono::Duration::minutes(1);
    let (a, b) = tokio::join!(repo.record(&stale, expired_at), repo.record(&stale, expired_at));
    a.unwrap();
    b.unwrap();
    let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM revoked_tokens WHERE token = $1")
        .bind(&stale)
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(rows.0, 1);

    assert!(repo.purge_expired(chrono::Utc::now()).await.unwrap() >= 1);
    assert!(!repo.is_revoked(&stale).await.unwrap());

    // Concurrent registrations racing for one email: the unique index admits one.
    let email = format!("race{}@x.com", suffix);
    let (name_a, name_b) = (format!("race-a{}", suffix), format!("race-b{}", suffix));
    let (a, b) = tokio::join!(
        repo.create_user(NewUser {
            username: &name_a,
            email: &email,
            password_hash: "$argon2id$hash",
        }),
        repo.create_user(NewUser {
            username: &name_b,
            email: &email,
            password_hash: "$argon2id$hash",
        }),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert!(
        matches!(a, Err(AppError::DuplicateCredential))
            || matches!(b, Err(AppError::DuplicateCredential))
    );
}
