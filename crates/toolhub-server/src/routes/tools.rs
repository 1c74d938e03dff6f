//! Tool listing and dispatch.

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
use toolhub_types::ToolDef;

#[derive(Serialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDef>,
}

#[derive(Serialize)]
pub struct ToolCallResponse {
    pub result: JsonValue,
}

/// List every registered tool with its input schema.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: state.tools.tools().to_vec(),
    })
}

/// Call a tool with a JSON object of arguments.
pub async fn call(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(args): Json<Map<String, JsonValue>>,
) -> Result<Json<ToolCallResponse>, (StatusCode, String)> {
    let result = state
        .tools
        .dispatch(&name, args)
        .map_err(|e| dispatch_error(&format!("Tool call {name}"), e))?;
    Ok(Json(ToolCallResponse { result }))
}
