//! End-to-end checks of the request pipeline through the public router.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use clap::Parser;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use storefront_backend::{api::create_router, build_state, clock::ManualClock, Config};

const SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Parse a config from defaults, with `overrides` replacing flags of the same name.
fn config(overrides: &[(&str, &str)]) -> Config {
    let mut flags = vec![
        ("--jwt-secret", SECRET),
        ("--jwt-ttl-secs", "3600"),
        ("--bcrypt-cost", "4"),
        ("--username", "elisha"),
        ("--password", "password"),
        ("--roles", "admin"),
    ];
    for &(flag, value) in overrides {
        match flags.iter_mut().find(|(f, _)| *f == flag) {
            Some(entry) => entry.1 = value,
            None => flags.push((flag, value)),
        }
    }

    let mut argv = vec!["storefront"];
    for (flag, value) in flags {
        argv.push(flag);
        argv.push(value);
    }
    Config::try_parse_from(argv).unwrap()
}

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
}

fn app_with(config: &Config) -> TestApp {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ));
    let state = build_state(config, clock.clone()).unwrap();
    TestApp {
        router: create_router(state),
        clock,
    }
}

fn app() -> TestApp {
    app_with(&config(&[]))
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, path: &str, authorization: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(path);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn login(&self, username: &str, password: &str) -> Response {
        let body = json!({ "username": username, "password": password }).to_string();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn token(&self) -> String {
        let response = self.login("elisha", "password").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        body["token"].as_str().unwrap().to_string()
    }
}

async fn text_body(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_login_then_token_lifecycle() {
    let app = app();

    let response = app.login("elisha", "password").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["username"], "elisha");
    let token = body["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());
    let bearer = format!("Bearer {}", token);

    let response = app.get("/api/auth/user", Some(&bearer)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "username": "elisha", "roles": ["admin"] })
    );

    let response = app.get("/api/products", Some(&bearer)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 5);

    app.clock.advance(Duration::seconds(3600));

    let response = app.get("/api/products", Some(&bearer)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        text_body(response).await,
        "Access Denied: Invalid or expired token"
    );

    let response = app.get("/api/auth/user", Some(&bearer)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let app = app();

    let wrong_password = app.login("elisha", "nope").await;
    let unknown_user = app.login("mallory", "password").await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        text_body(wrong_password).await,
        text_body(unknown_user).await
    );
}

#[tokio::test]
async fn test_public_and_protected_routes_without_token() {
    let app = app();

    let response = app.get("/api/products", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    assert_eq!(
        text_body(response).await,
        "Access Denied: Full authentication is required to access this resource"
    );

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "UP");

    let response = app.get("/api/products/1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["name"], "Angular Speedster Board");

    let response = app.get("/api/products/brands", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/products/99", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["status"], 404);
}

#[tokio::test]
async fn test_garbage_token_never_blocks_public_routes() {
    let app = app();

    let response = app.get("/api/products/2", Some("Bearer not.a.jwt")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/products", Some("Bearer not.a.jwt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        text_body(response).await,
        "Access Denied: Invalid or expired token"
    );
}

#[tokio::test]
async fn test_current_user_header_handling() {
    let app = app();

    let response = app.get("/api/auth/user", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/auth/user", Some("Basic ZWxpc2hhOnBhc3N3b3Jk")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/auth/user", Some("Bearer garbage")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_key_is_rejected() {
    let issuer = app_with(&config(&[(
        "--jwt-secret",
        "another-secret-abcdefghijklmnopqrstuvwxyz",
    )]));
    let token = issuer.token().await;

    let app = app();
    let response = app
        .get("/api/products", Some(&format!("Bearer {}", token)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sqlite_store_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("identities.db");
    let db_path = db_path.to_str().unwrap();

    let app = app_with(&config(&[("--auth-db-path", db_path), ("--roles", "admin,buyer")]));
    let token = app.token().await;

    let response = app
        .get("/api/auth/user", Some(&format!("Bearer {}", token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "username": "elisha", "roles": ["admin", "buyer"] })
    );

    // Re-provisioning with a new password invalidates the old one
    let reprovisioned = app_with(&config(&[("--auth-db-path", db_path), ("--password", "rotated")]));
    let response = reprovisioned.login("elisha", "password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = reprovisioned.login("elisha", "rotated").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = app();
    let response = app.get("/api/products/1", None).await;
    assert!(response.headers().contains_key("x-request-id"));
}
