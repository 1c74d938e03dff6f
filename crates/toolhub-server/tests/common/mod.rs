//! Common test utilities for integration tests.

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tempfile::TempDir;
use toolhub_core::DocumentClient;
use toolhub_server::{config::Config, routes, state::AppState};
use tower::ServiceExt;

/// Create a test app over an on-disk store in a temp directory.
pub fn create_test_app() -> (Router, Arc<AppState>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        port: 0,
        db_path: temp_dir.path().join("toolhub.db"),
        ..Config::default()
    };
    let state = Arc::new(AppState::new(config));
    (app_for(state.clone()), state, temp_dir)
}

/// Create a test app whose store is unreachable.
pub fn create_unavailable_app() -> (Router, Arc<AppState>) {
    let client = Arc::new(DocumentClient::unavailable("connection refused"));
    let state = Arc::new(AppState::with_client(Config::default(), client));
    (app_for(state.clone()), state)
}

fn app_for(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", routes::api_router())
        .with_state(state)
}

/// Send a request and decode the JSON response body.
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(JsonValue::String(
        String::from_utf8_lossy(&bytes).into_owned(),
    ));
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, JsonValue) {
    send(app, "GET", uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
    send(app, "POST", uri, Some(body)).await
}
