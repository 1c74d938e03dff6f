//! Interaction logging tools.
//!
//! Tools: log_interaction, get_agent_logs, get_agent_statistics
//!
//! Date arguments accept RFC 3339 or `YYYY-MM-DD`. An unparseable bound is not
//! a dispatch error: the query returns an empty result and a warning is logged.

use super::{
    ToolResult, get_optional_f64, get_optional_object, get_optional_string, get_optional_u64,
    get_string_arg,
};
use crate::ToolError;
use crate::dates::{DateBound, parse_date_bound};
use crate::interactions::InteractionLog;
use crate::schema;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue, json};
use toolhub_types::{
    DEFAULT_LOG_LIMIT, NewInteraction, QueryFilter, StatisticsPeriod, StatisticsResult, ToolDef,
};
use tracing::warn;

pub(super) const LOG_INTERACTION: &str = "log_interaction";
pub(super) const GET_AGENT_LOGS: &str = "get_agent_logs";
pub(super) const GET_AGENT_STATISTICS: &str = "get_agent_statistics";

pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            LOG_INTERACTION,
            "Record one agent interaction (chat turn, task execution, query). \
             Returns {\"success\": bool}.",
            schema!(object {
                required: {
                    "project_name": string,
                    "agent_name": string,
                    "interaction_type": string
                },
                optional: {
                    "user_input": string,
                    "agent_response": string,
                    "metadata": object,
                    "session_id": string,
                    "status": string,
                    "execution_time_ms": number,
                    "timestamp": string
                }
            }),
        ),
        ToolDef::new(
            GET_AGENT_LOGS,
            "List logged interactions, newest first. All filters are optional; \
             dates are inclusive bounds on the event time. Default limit is 100.",
            schema!(object {
                optional: {
                    "project_name": string,
                    "agent_name": string,
                    "session_id": string,
                    "start_date": string,
                    "end_date": string,
                    "limit": integer
                }
            }),
        ),
        ToolDef::new(
            GET_AGENT_STATISTICS,
            "Aggregate statistics for one project and agent: total interactions, \
             counts per interaction type and per task status, and mean execution time.",
            schema!(object {
                required: { "project_name": string, "agent_name": string },
                optional: { "start_date": string, "end_date": string }
            }),
        ),
    ]
}

pub fn dispatch(
    log: &InteractionLog,
    name: &str,
    args: Map<String, JsonValue>,
) -> ToolResult<JsonValue> {
    match name {
        LOG_INTERACTION => {
            let new = new_interaction_from_args(&args)?;
            Ok(json!({ "success": log.log_interaction(new) }))
        }

        GET_AGENT_LOGS => {
            let (Some(start_date), Some(end_date)) = (
                date_arg(&args, "start_date", DateBound::Start)?,
                date_arg(&args, "end_date", DateBound::End)?,
            ) else {
                return Ok(json!([]));
            };
            let limit = get_optional_u64(&args, "limit")?
                .map(|l| u32::try_from(l).unwrap_or(u32::MAX))
                .unwrap_or(DEFAULT_LOG_LIMIT);
            let filter = QueryFilter {
                project_name: get_optional_string(&args, "project_name")?,
                agent_name: get_optional_string(&args, "agent_name")?,
                session_id: get_optional_string(&args, "session_id")?,
                start_date,
                end_date,
                limit,
            };
            to_json(log.get_logs(&filter))
        }

        GET_AGENT_STATISTICS => {
            let project_name = get_string_arg(&args, "project_name")?;
            let agent_name = get_string_arg(&args, "agent_name")?;
            let stats = match (
                date_arg(&args, "start_date", DateBound::Start)?,
                date_arg(&args, "end_date", DateBound::End)?,
            ) {
                (Some(start), Some(end)) => log.get_statistics(&project_name, &agent_name, start, end),
                _ => StatisticsResult::empty(project_name, agent_name, StatisticsPeriod::default()),
            };
            to_json(stats)
        }

        _ => Err(ToolError::UnknownTool(name.to_string())),
    }
}

/// Build an interaction from loosely typed arguments.
///
/// `metadata: null` counts as absent. `timestamp` goes through
/// [`parse_date_bound`], so a plain date means midnight UTC.
pub fn new_interaction_from_args(args: &Map<String, JsonValue>) -> ToolResult<NewInteraction> {
    let mut new = NewInteraction::new(
        get_string_arg(args, "project_name")?,
        get_string_arg(args, "agent_name")?,
        get_string_arg(args, "interaction_type")?,
    );
    new.user_input = get_optional_string(args, "user_input")?;
    new.agent_response = get_optional_string(args, "agent_response")?;
    new.metadata = get_optional_object(args, "metadata")?.unwrap_or_default();
    new.session_id = get_optional_string(args, "session_id")?;
    new.status = get_optional_string(args, "status")?;
    new.execution_time_ms = get_optional_f64(args, "execution_time_ms")?;
    new.timestamp = match get_optional_string(args, "timestamp")? {
        None => None,
        Some(raw) => Some(parse_date_bound(&raw, DateBound::Start).ok_or_else(|| {
            ToolError::InvalidArg {
                name: "timestamp".to_string(),
                reason: format!("unrecognised date '{raw}'"),
            }
        })?),
    };
    Ok(new)
}

/// Parse an optional date argument.
///
/// The outer `Option` is `None` when the argument was given but is not a date;
/// callers treat that as "matches nothing".
fn date_arg(
    args: &Map<String, JsonValue>,
    name: &str,
    bound: DateBound,
) -> ToolResult<Option<Option<DateTime<Utc>>>> {
    let Some(raw) = get_optional_string(args, name)? else {
        return Ok(Some(None));
    };
    match parse_date_bound(&raw, bound) {
        Some(dt) => Ok(Some(Some(dt))),
        None => {
            warn!(target: "toolhub::tools", "Ignoring query with unparseable {}: {:?}", name, raw);
            Ok(None)
        }
    }
}

fn to_json<T: serde::Serialize>(value: T) -> ToolResult<JsonValue> {
    serde_json::to_value(value).map_err(|e| ToolError::Failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::testing::memory_log;

    fn call(log: &InteractionLog, name: &str, args: JsonValue) -> ToolResult<JsonValue> {
        dispatch(log, name, args.as_object().cloned().unwrap())
    }

    fn seed(log: &InteractionLog) {
        for (kind, status, ms, ts) in [
            ("task", Some("completed"), Some(100.0), "2025-03-01T10:00:00Z"),
            ("task", Some("failed"), Some(300.0), "2025-03-02T10:00:00Z"),
            ("chat", None, None, "2025-03-03T10:00:00Z"),
        ] {
            let out = call(
                log,
                LOG_INTERACTION,
                json!({
                    "project_name": "atlas",
                    "agent_name": "planner",
                    "interaction_type": kind,
                    "status": status,
                    "execution_time_ms": ms,
                    "metadata": {"source": "test"},
                    "timestamp": ts
                }),
            )
            .unwrap();
            assert_eq!(out, json!({"success": true}));
        }
    }

    #[test]
    fn test_log_then_list() {
        let log = memory_log();
        seed(&log);

        let out = call(&log, GET_AGENT_LOGS, json!({"project_name": "atlas", "limit": 2})).unwrap();
        let logs = out.as_array().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0]["interaction_type"], "chat");
        assert_eq!(logs[0]["metadata"]["source"], "test");
        assert!(logs[0]["_id"].is_string());
    }

    #[test]
    fn test_date_only_bounds_cover_whole_days() {
        let log = memory_log();
        seed(&log);

        let out = call(
            &log,
            GET_AGENT_LOGS,
            json!({"start_date": "2025-03-02", "end_date": "2025-03-03"}),
        )
        .unwrap();
        assert_eq!(out.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_unparseable_date_matches_nothing() {
        let log = memory_log();
        seed(&log);

        let out = call(&log, GET_AGENT_LOGS, json!({"start_date": "soon"})).unwrap();
        assert_eq!(out, json!([]));

        let out = call(
            &log,
            GET_AGENT_STATISTICS,
            json!({"project_name": "atlas", "agent_name": "planner", "end_date": "later"}),
        )
        .unwrap();
        assert_eq!(out["total_interactions"], 0);
    }

    #[test]
    fn test_statistics() {
        let log = memory_log();
        seed(&log);

        let out = call(
            &log,
            GET_AGENT_STATISTICS,
            json!({"project_name": "atlas", "agent_name": "planner", "start_date": "2025-03-01"}),
        )
        .unwrap();
        assert_eq!(out["total_interactions"], 3);
        assert_eq!(out["interaction_types"], json!({"task": 2, "chat": 1}));
        assert_eq!(out["task_statuses"], json!({"completed": 1, "failed": 1}));
        assert_eq!(out["average_execution_time_ms"], 200.0);
        assert_eq!(out["period"]["start_date"], "2025-03-01T00:00:00.000000Z");
        assert!(out["period"]["end_date"].is_null());
    }

    #[test]
    fn test_bad_arguments() {
        let log = memory_log();
        let err = call(&log, LOG_INTERACTION, json!({"project_name": "atlas"})).unwrap_err();
        assert!(matches!(err, ToolError::MissingArg(name) if name == "agent_name"));

        let err = call(
            &log,
            LOG_INTERACTION,
            json!({
                "project_name": "atlas",
                "agent_name": "planner",
                "interaction_type": "chat",
                "timestamp": "whenever"
            }),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArg { .. }));

        let err = call(&log, GET_AGENT_LOGS, json!({"limit": -1})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArg { .. }));
    }

    #[test]
    fn test_blank_names_report_failure() {
        let log = memory_log();
        let out = call(
            &log,
            LOG_INTERACTION,
            json!({"project_name": "", "agent_name": "planner", "interaction_type": "chat"}),
        )
        .unwrap();
        assert_eq!(out, json!({"success": false}));
    }
}
