//! Prompt listing and rendering.

use super::dispatch_error;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use toolhub_types::PromptDef;

#[derive(Serialize)]
pub struct PromptListResponse {
    pub prompts: Vec<PromptDef>,
}

#[derive(Serialize)]
pub struct PromptResponse {
    pub name: String,
    pub text: String,
}

pub async fn list(State(state): State<Arc<AppState>>) -> Json<PromptListResponse> {
    Json(PromptListResponse {
        prompts: state.prompts.prompts().to_vec(),
    })
}

/// Render a prompt with a JSON object of arguments.
pub async fn render(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(args): Json<Map<String, JsonValue>>,
) -> Result<Json<PromptResponse>, (StatusCode, String)> {
    let text = state
        .prompts
        .render(&name, &args)
        .map_err(|e| dispatch_error(&format!("Prompt {name}"), e))?;
    Ok(Json(PromptResponse { name, text }))
}
