//! HTTP route handlers.

pub mod interactions;
pub mod prompts;
pub mod resources;
pub mod tools;

use crate::state::AppState;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use toolhub_core::ToolError;

/// Routes served under `/api`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(tools::list))
        .route("/tools/{name}", post(tools::call))
        .route(
            "/interactions",
            get(interactions::list).post(interactions::create),
        )
        .route("/interactions/stats", get(interactions::stats))
        .route("/prompts", get(prompts::list))
        .route("/prompts/{name}", post(prompts::render))
        .route("/resources", get(resources::list))
        .route("/resources/{scheme}/{*path}", get(resources::read))
}

/// Map a dispatch failure to an HTTP error, logging it under `toolhub::api`.
pub(crate) fn dispatch_error(what: &str, e: ToolError) -> (StatusCode, String) {
    let status = match &e {
        ToolError::UnknownTool(_) | ToolError::UnknownPrompt(_) | ToolError::UnknownResource(_) => {
            StatusCode::NOT_FOUND
        }
        ToolError::MissingArg(_) | ToolError::InvalidArg { .. } => StatusCode::BAD_REQUEST,
        ToolError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(target: "toolhub::api", "{} failed: {}", what, e);
    (status, e.to_string())
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: String,
    pub version: String,
    /// Whether the document store answered a ping.
    pub store: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store = match state.client.ping() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(target: "toolhub::api", "Store ping failed: {}", e);
            false
        }
    };
    Json(HealthResponse {
        status: if store { "ok" } else { "degraded" },
        name: state.config.server_name.clone(),
        version: state.config.server_version.clone(),
        store,
    })
}
