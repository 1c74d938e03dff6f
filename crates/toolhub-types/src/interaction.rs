//! Interaction logging types.
//!
//! An interaction is one logged event describing an agent's activity (a chat
//! turn, a task execution, a query). Records are written once and never updated.

use crate::document::{Document, Value, format_instant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use thiserror::Error;

/// Default number of records returned by a log query.
pub const DEFAULT_LOG_LIMIT: u32 = 100;

/// Document keys of an interaction record.
pub mod fields {
    pub const ID: &str = "_id";
    pub const PROJECT_NAME: &str = "project_name";
    pub const AGENT_NAME: &str = "agent_name";
    pub const INTERACTION_TYPE: &str = "interaction_type";
    pub const USER_INPUT: &str = "user_input";
    pub const AGENT_RESPONSE: &str = "agent_response";
    pub const METADATA: &str = "metadata";
    pub const SESSION_ID: &str = "session_id";
    pub const STATUS: &str = "status";
    pub const EXECUTION_TIME_MS: &str = "execution_time_ms";
    pub const TIMESTAMP: &str = "timestamp";
    pub const CREATED_AT: &str = "created_at";
}

/// Errors raised when reading a record back out of a document.
#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid field {field}: expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// Caller-supplied fields of an interaction to be logged.
///
/// `id` and `created_at` are never supplied by the caller; `timestamp` defaults
/// to the write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInteraction {
    pub project_name: String,
    pub agent_name: String,
    /// Free-form tag, e.g. "chat", "task", "query".
    pub interaction_type: String,
    #[serde(default)]
    pub user_input: Option<String>,
    #[serde(default)]
    pub agent_response: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Map<String, JsonValue>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Only set for task-like interactions.
    #[serde(default)]
    pub status: Option<String>,
    /// Only set when the interaction was timed.
    #[serde(default)]
    pub execution_time_ms: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, JsonValue>>::deserialize(deserializer)?.unwrap_or_default())
}

impl NewInteraction {
    pub fn new(
        project_name: impl Into<String>,
        agent_name: impl Into<String>,
        interaction_type: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            agent_name: agent_name.into(),
            interaction_type: interaction_type.into(),
            user_input: None,
            agent_response: None,
            metadata: Map::new(),
            session_id: None,
            status: None,
            execution_time_ms: None,
            timestamp: None,
        }
    }

    /// Name of the first required field that is empty, if any.
    pub fn missing_required(&self) -> Option<&'static str> {
        if self.project_name.trim().is_empty() {
            Some(fields::PROJECT_NAME)
        } else if self.agent_name.trim().is_empty() {
            Some(fields::AGENT_NAME)
        } else if self.interaction_type.trim().is_empty() {
            Some(fields::INTERACTION_TYPE)
        } else {
            None
        }
    }

    /// Fill defaults and stamp the record with the write time.
    pub fn into_record(self, now: DateTime<Utc>) -> InteractionRecord {
        InteractionRecord {
            id: None,
            project_name: self.project_name,
            agent_name: self.agent_name,
            interaction_type: self.interaction_type,
            user_input: self.user_input,
            agent_response: self.agent_response,
            metadata: self.metadata,
            session_id: self.session_id,
            status: self.status,
            execution_time_ms: self.execution_time_ms,
            timestamp: self.timestamp.unwrap_or(now),
            created_at: now,
        }
    }
}

/// One logged interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Store-assigned identifier, `None` until inserted.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub project_name: String,
    pub agent_name: String,
    pub interaction_type: String,
    pub user_input: Option<String>,
    pub agent_response: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, JsonValue>,
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl InteractionRecord {
    /// Document shape written to the store.
    ///
    /// Absent text fields are written as nulls; absent `status` and
    /// `execution_time_ms` are omitted so that "present" means the key exists.
    /// The identifier is left to the store.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(fields::PROJECT_NAME, self.project_name.as_str());
        doc.insert(fields::AGENT_NAME, self.agent_name.as_str());
        doc.insert(fields::INTERACTION_TYPE, self.interaction_type.as_str());
        doc.insert(fields::USER_INPUT, self.user_input.clone());
        doc.insert(fields::AGENT_RESPONSE, self.agent_response.clone());
        doc.insert(
            fields::METADATA,
            Value::from_json(JsonValue::Object(self.metadata.clone())),
        );
        doc.insert(fields::SESSION_ID, self.session_id.clone());
        if let Some(status) = &self.status {
            doc.insert(fields::STATUS, status.as_str());
        }
        if let Some(ms) = self.execution_time_ms {
            doc.insert(fields::EXECUTION_TIME_MS, ms);
        }
        doc.insert(fields::TIMESTAMP, self.timestamp);
        doc.insert(fields::CREATED_AT, self.created_at);
        doc
    }

    /// Read a record from either a store-native or a serialized document.
    pub fn from_document(doc: &Document) -> Result<Self, RecordError> {
        let id = match doc.get(fields::ID) {
            None | Some(Value::Null) => None,
            Some(Value::ObjectId(id)) => Some(id.to_hex()),
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(RecordError::InvalidField {
                    field: fields::ID,
                    expected: "identifier",
                });
            }
        };

        let metadata = match doc.get(fields::METADATA) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Document(meta)) => match meta.to_json() {
                JsonValue::Object(map) => map,
                _ => Map::new(),
            },
            Some(_) => {
                return Err(RecordError::InvalidField {
                    field: fields::METADATA,
                    expected: "mapping",
                });
            }
        };

        Ok(Self {
            id,
            project_name: required_str(doc, fields::PROJECT_NAME)?,
            agent_name: required_str(doc, fields::AGENT_NAME)?,
            interaction_type: required_str(doc, fields::INTERACTION_TYPE)?,
            user_input: optional_str(doc, fields::USER_INPUT)?,
            agent_response: optional_str(doc, fields::AGENT_RESPONSE)?,
            metadata,
            session_id: optional_str(doc, fields::SESSION_ID)?,
            status: optional_str(doc, fields::STATUS)?,
            execution_time_ms: match doc.get(fields::EXECUTION_TIME_MS) {
                None | Some(Value::Null) => None,
                Some(v) => Some(v.as_f64().ok_or(RecordError::InvalidField {
                    field: fields::EXECUTION_TIME_MS,
                    expected: "number",
                })?),
            },
            timestamp: required_instant(doc, fields::TIMESTAMP)?,
            created_at: required_instant(doc, fields::CREATED_AT)?,
        })
    }
}

fn required_str(doc: &Document, field: &'static str) -> Result<String, RecordError> {
    optional_str(doc, field)?.ok_or(RecordError::MissingField(field))
}

fn optional_str(doc: &Document, field: &'static str) -> Result<Option<String>, RecordError> {
    match doc.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RecordError::InvalidField {
            field,
            expected: "string",
        }),
    }
}

fn required_instant(doc: &Document, field: &'static str) -> Result<DateTime<Utc>, RecordError> {
    let value = doc.get(field).ok_or(RecordError::MissingField(field))?;
    value.as_datetime().ok_or(RecordError::InvalidField {
        field,
        expected: "instant",
    })
}

/// Criteria for a log query. Every criterion is optional and narrows the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Inclusive lower bound on `timestamp`.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LOG_LIMIT
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            project_name: None,
            agent_name: None,
            session_id: None,
            start_date: None,
            end_date: None,
            limit: DEFAULT_LOG_LIMIT,
        }
    }
}

/// Requested bounds echoed back in a statistics result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsPeriod {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl StatisticsPeriod {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start_date: start.as_ref().map(format_instant),
            end_date: end.as_ref().map(format_instant),
        }
    }
}

/// Aggregate statistics for one project/agent pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResult {
    pub project_name: String,
    pub agent_name: String,
    pub total_interactions: u64,
    /// Count per `interaction_type`.
    pub interaction_types: BTreeMap<String, u64>,
    /// Count per `status`, over records that carry one.
    pub task_statuses: BTreeMap<String, u64>,
    /// Mean over records that carry `execution_time_ms`; `None` when no record
    /// does (never zero).
    pub average_execution_time_ms: Option<f64>,
    pub period: StatisticsPeriod,
}

impl StatisticsResult {
    /// Zero-valued result for the given scope.
    pub fn empty(
        project_name: impl Into<String>,
        agent_name: impl Into<String>,
        period: StatisticsPeriod,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            agent_name: agent_name.into(),
            total_interactions: 0,
            interaction_types: BTreeMap::new(),
            task_statuses: BTreeMap::new(),
            average_execution_time_ms: None,
            period,
        }
    }
}
