//! Shared helpers for the HTTP-level tests.

#![allow(dead_code)]

use axum::http::{header, HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use warden::{api::routes::create_router, AppState, TursoClient, WardenConfig};

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";

/// State over a fresh in-memory store.
pub async fn create_test_state(config: WardenConfig) -> AppState {
    let store = TursoClient::new_memory()
        .await
        .expect("Failed to open in-memory store");

    AppState::new(config, Arc::new(store), TEST_SECRET)
}

pub async fn create_test_server_with(config: WardenConfig) -> TestServer {
    let app = create_router(create_test_state(config).await);
    TestServer::new(app).expect("Failed to create test server")
}

pub async fn create_test_server() -> TestServer {
    create_test_server_with(WardenConfig::default()).await
}

pub fn authorization() -> HeaderName {
    header::AUTHORIZATION
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).expect("token is a valid header value")
}

/// Creates an account and returns `(id, token)`.
pub async fn register(server: &TestServer, username: &str, email: &str, password: &str) -> (String, String) {
    let response = server
        .post("/api/v1/users")
        .json(&json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = response.json();

    (
        body["data"]["id"].as_str().expect("id in response").to_string(),
        body["token"].as_str().expect("token in response").to_string(),
    )
}

pub fn message(body: &Value) -> &str {
    body["message"].as_str().unwrap_or_default()
}
