use super::{InteractionLog, Scope};
use crate::serialize::serialize_document;
use crate::store::{FindOptions, SortOrder};
use crate::{Result, StoreError};
use toolhub_types::{Document, InteractionRecord, QueryFilter, fields};
use tracing::{debug, error, warn};

impl InteractionLog {
    /// Records matching `filter`, newest first, at most `filter.limit` of them.
    ///
    /// Documents are returned in transport form (identifiers and instants as
    /// strings). Failures are logged and produce an empty list.
    pub fn get_logs(&self, filter: &QueryFilter) -> Vec<Document> {
        match self.try_get_logs(filter) {
            Ok(docs) => docs,
            Err(StoreError::InvalidInput(reason)) => {
                warn!(target: "toolhub::interactions", "Rejected log query: {}", reason);
                Vec::new()
            }
            Err(e) => {
                error!(target: "toolhub::interactions", "Failed to query interaction logs: {}", e);
                Vec::new()
            }
        }
    }

    pub fn try_get_logs(&self, filter: &QueryFilter) -> Result<Vec<Document>> {
        Ok(self.find_logs(filter)?.iter().map(serialize_document).collect())
    }

    /// Typed form of [`try_get_logs`](Self::try_get_logs). Documents that do
    /// not read back as records are skipped with a warning.
    pub fn try_get_records(&self, filter: &QueryFilter) -> Result<Vec<InteractionRecord>> {
        let records = self
            .find_logs(filter)?
            .iter()
            .filter_map(|doc| match InteractionRecord::from_document(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(target: "toolhub::interactions", "Skipping malformed record: {}", e);
                    None
                }
            })
            .collect();
        Ok(records)
    }

    fn find_logs(&self, filter: &QueryFilter) -> Result<Vec<Document>> {
        if filter.limit == 0 {
            return Err(StoreError::InvalidInput("limit must be positive".to_string()));
        }

        let scope = Scope {
            project_name: filter.project_name.as_deref(),
            agent_name: filter.agent_name.as_deref(),
            session_id: filter.session_id.as_deref(),
            start: filter.start_date,
            end: filter.end_date,
        };
        if scope.is_empty_range() {
            return Ok(Vec::new());
        }

        let options = FindOptions::sorted(fields::TIMESTAMP, SortOrder::Descending)
            .with_limit(u64::from(filter.limit));
        let docs = self.collection.find(&scope.to_filter(), &options)?;
        debug!(target: "toolhub::interactions", "Log query matched {} records", docs.len());
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use crate::interactions::InteractionLog;
    use crate::interactions::testing::{FailingCollection, memory_log};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Arc;
    use toolhub_types::{NewInteraction, QueryFilter, Value, fields, format_instant};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap()
    }

    fn seed(log: &InteractionLog, rows: &[(&str, &str, Option<&str>, i64)]) {
        for (project, agent, session, minutes) in rows {
            let mut new = NewInteraction::new(*project, *agent, "chat");
            new.session_id = session.map(str::to_string);
            new.timestamp = Some(t0() + Duration::minutes(*minutes));
            assert!(log.log_interaction(new));
        }
    }

    fn timestamps(log: &InteractionLog, filter: &QueryFilter) -> Vec<String> {
        log.get_logs(filter)
            .iter()
            .map(|d| d.get_str(fields::TIMESTAMP).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_newest_first_with_limit() {
        let log = memory_log();
        seed(
            &log,
            &[
                ("atlas", "planner", None, 5),
                ("atlas", "planner", None, 1),
                ("atlas", "planner", None, 9),
                ("atlas", "planner", None, 3),
            ],
        );

        let filter = QueryFilter {
            limit: 3,
            ..Default::default()
        };
        let got = timestamps(&log, &filter);
        assert_eq!(got.len(), 3);
        let mut sorted = got.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(got, sorted);
        assert!(got[0].starts_with("2025-07-01T09:09:00"));
    }

    #[test]
    fn test_limit_keeps_the_most_recent() {
        let log = memory_log();
        seed(
            &log,
            &[
                ("atlas", "planner", None, 5),
                ("atlas", "planner", None, 1),
                ("atlas", "planner", None, 9),
                ("atlas", "planner", None, 3),
                ("atlas", "planner", None, 0),
            ],
        );

        let filter = QueryFilter {
            limit: 3,
            ..Default::default()
        };
        let expected: Vec<String> = [9, 5, 3]
            .into_iter()
            .map(|m| format_instant(&(t0() + Duration::minutes(m))))
            .collect();
        assert_eq!(timestamps(&log, &filter), expected);
    }

    #[test]
    fn test_criteria_narrow_the_result() {
        let log = memory_log();
        seed(
            &log,
            &[
                ("atlas", "planner", Some("s1"), 0),
                ("atlas", "coder", Some("s1"), 1),
                ("atlas", "planner", Some("s2"), 2),
                ("zephyr", "planner", Some("s1"), 3),
            ],
        );

        let all = log.get_logs(&QueryFilter::default());
        let by_project = log.get_logs(&QueryFilter {
            project_name: Some("atlas".to_string()),
            ..Default::default()
        });
        let by_project_agent = log.get_logs(&QueryFilter {
            project_name: Some("atlas".to_string()),
            agent_name: Some("planner".to_string()),
            ..Default::default()
        });
        let by_all = log.get_logs(&QueryFilter {
            project_name: Some("atlas".to_string()),
            agent_name: Some("planner".to_string()),
            session_id: Some("s1".to_string()),
            ..Default::default()
        });

        assert_eq!(all.len(), 4);
        assert_eq!(by_project.len(), 3);
        assert_eq!(by_project_agent.len(), 2);
        assert_eq!(by_all.len(), 1);
        assert!(by_project_agent.iter().all(|d| {
            d.get_str(fields::PROJECT_NAME) == Some("atlas")
                && d.get_str(fields::AGENT_NAME) == Some("planner")
        }));
    }

    #[test]
    fn test_agent_and_date_range_intersect() {
        let log = memory_log();
        seed(
            &log,
            &[
                ("atlas", "planner", None, 0),
                ("atlas", "planner", None, 10),
                ("atlas", "planner", None, 20),
                ("atlas", "coder", None, 10),
                ("atlas", "coder", None, 15),
            ],
        );

        let by_agent = QueryFilter {
            agent_name: Some("planner".to_string()),
            ..Default::default()
        };
        let by_window = QueryFilter {
            start_date: Some(t0() + Duration::minutes(5)),
            end_date: Some(t0() + Duration::minutes(20)),
            ..Default::default()
        };
        let by_both = QueryFilter {
            agent_name: Some("planner".to_string()),
            start_date: by_window.start_date,
            end_date: by_window.end_date,
            ..Default::default()
        };

        let agent_only = timestamps(&log, &by_agent);
        let window_only = log.get_logs(&by_window);
        let both = log.get_logs(&by_both);

        assert_eq!(agent_only.len(), 3);
        assert_eq!(window_only.len(), 4);
        assert_eq!(both.len(), 2);
        assert!(both.len() <= agent_only.len());
        for doc in &both {
            assert_eq!(doc.get_str(fields::AGENT_NAME), Some("planner"));
            assert!(window_only.contains(doc));
            assert!(agent_only.contains(&doc.get_str(fields::TIMESTAMP).unwrap().to_string()));
        }
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let log = memory_log();
        seed(
            &log,
            &[
                ("atlas", "planner", None, 0),
                ("atlas", "planner", None, 10),
                ("atlas", "planner", None, 20),
                ("atlas", "planner", None, 30),
            ],
        );

        let filter = QueryFilter {
            start_date: Some(t0() + Duration::minutes(10)),
            end_date: Some(t0() + Duration::minutes(20)),
            ..Default::default()
        };
        assert_eq!(timestamps(&log, &filter).len(), 2);

        let inverted = QueryFilter {
            start_date: Some(t0() + Duration::minutes(20)),
            end_date: Some(t0() + Duration::minutes(10)),
            ..Default::default()
        };
        assert!(log.get_logs(&inverted).is_empty());
    }

    #[test]
    fn test_results_are_transport_safe() {
        let log = memory_log();
        seed(&log, &[("atlas", "planner", None, 0)]);

        let docs = log.get_logs(&QueryFilter::default());
        assert!(matches!(docs[0].get(fields::ID), Some(Value::String(_))));
        assert!(matches!(docs[0].get(fields::CREATED_AT), Some(Value::String(_))));

        let records = log.try_get_records(&QueryFilter::default()).unwrap();
        assert_eq!(records[0].timestamp, t0());
        assert_eq!(records[0].id.as_deref(), docs[0].get_str(fields::ID));
    }

    #[test]
    fn test_metadata_round_trips_unchanged() {
        let log = memory_log();
        let metadata = serde_json::json!({
            "when": {"$date": "2025-01-01T00:00:00Z"},
            "ref": {"$oid": "0123456789abcdef0123456789abcdef"},
            "big": u64::MAX,
            "nested": {"$$keep": [1, -2, 0.5]}
        });
        let mut new = NewInteraction::new("atlas", "planner", "chat");
        new.metadata = metadata.as_object().unwrap().clone();
        assert!(log.log_interaction(new));

        let records = log.try_get_records(&QueryFilter::default()).unwrap();
        assert_eq!(serde_json::Value::Object(records[0].metadata.clone()), metadata);

        let docs = log.get_logs(&QueryFilter::default());
        assert_eq!(docs[0].get_document(fields::METADATA).unwrap().to_json(), metadata);
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let log = memory_log();
        seed(&log, &[("atlas", "planner", None, 0)]);
        let filter = QueryFilter {
            limit: 0,
            ..Default::default()
        };
        assert!(log.get_logs(&filter).is_empty());
        assert!(log.try_get_logs(&filter).is_err());
    }

    #[test]
    fn test_store_failure_yields_empty() {
        let failing = Arc::new(FailingCollection::default());
        let log = InteractionLog::new(failing.clone());
        assert!(log.get_logs(&QueryFilter::default()).is_empty());
        assert!(log.try_get_logs(&QueryFilter::default()).is_err());
        assert_eq!(failing.call_count(), 2);
    }
}
