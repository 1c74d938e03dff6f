//! Interaction log API routes.
//!
//! Provides endpoints for:
//! - Recording an interaction
//! - Listing logged interactions
//! - Per-agent statistics

use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use toolhub_core::tools::new_interaction_from_args;
use toolhub_core::{DateBound, parse_date_bound};
use toolhub_types::{DEFAULT_LOG_LIMIT, Document, QueryFilter, StatisticsPeriod, StatisticsResult};

#[derive(Serialize)]
pub struct LogResponse {
    pub success: bool,
}

/// Record one interaction.
///
/// The body is read with the same argument rules as the `log_interaction` tool.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, JsonValue>>,
) -> Result<Json<LogResponse>, (StatusCode, String)> {
    let new = new_interaction_from_args(&body).map_err(|e| {
        tracing::warn!(target: "toolhub::api", "Rejected interaction: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;
    Ok(Json(LogResponse {
        success: state.log.log_interaction(new),
    }))
}

#[derive(Deserialize)]
pub struct LogListQuery {
    pub project_name: Option<String>,
    pub agent_name: Option<String>,
    pub session_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct LogListResponse {
    pub logs: Vec<Document>,
    pub count: usize,
}

/// List interactions, newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogListQuery>,
) -> Json<LogListResponse> {
    let logs = match parse_bounds(query.start_date.as_deref(), query.end_date.as_deref()) {
        Some((start_date, end_date)) => state.log.get_logs(&QueryFilter {
            project_name: query.project_name,
            agent_name: query.agent_name,
            session_id: query.session_id,
            start_date,
            end_date,
            limit: query.limit.unwrap_or(DEFAULT_LOG_LIMIT),
        }),
        None => Vec::new(),
    };
    Json(LogListResponse {
        count: logs.len(),
        logs,
    })
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub project_name: String,
    pub agent_name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Statistics for one project/agent pair.
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Json<StatisticsResult> {
    let stats = match parse_bounds(query.start_date.as_deref(), query.end_date.as_deref()) {
        Some((start, end)) => {
            state
                .log
                .get_statistics(&query.project_name, &query.agent_name, start, end)
        }
        None => StatisticsResult::empty(
            query.project_name,
            query.agent_name,
            StatisticsPeriod::default(),
        ),
    };
    Json(stats)
}

/// Parse optional date bounds; `None` when either is given but unparseable.
fn parse_bounds(
    start: Option<&str>,
    end: Option<&str>,
) -> Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let parse = |raw: Option<&str>, bound| match raw {
        None => Some(None),
        Some(raw) => match parse_date_bound(raw, bound) {
            Some(dt) => Some(Some(dt)),
            None => {
                tracing::warn!(target: "toolhub::api", "Unparseable date bound: {:?}", raw);
                None
            }
        },
    };
    Some((parse(start, DateBound::Start)?, parse(end, DateBound::End)?))
}
