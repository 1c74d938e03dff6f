use super::{InteractionLog, Scope};
use crate::store::{Accumulator, Filter, Stage};
use crate::{Result, StoreError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use toolhub_types::{Document, StatisticsPeriod, StatisticsResult, Value, fields};
use tracing::{debug, error, warn};

const GROUP_KEY: &str = "_id";
const COUNT: &str = "count";
const AVERAGE: &str = "average";

impl InteractionLog {
    /// Aggregate statistics for one project/agent pair, optionally bounded in time.
    ///
    /// Failures are logged and produce a zero-valued result that still echoes
    /// the requested scope and period.
    pub fn get_statistics(
        &self,
        project_name: &str,
        agent_name: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StatisticsResult {
        match self.try_get_statistics(project_name, agent_name, start, end) {
            Ok(stats) => stats,
            Err(e) => {
                if let StoreError::InvalidInput(reason) = &e {
                    warn!(target: "toolhub::interactions", "Rejected statistics request: {}", reason);
                } else {
                    error!(
                        target: "toolhub::interactions",
                        "Failed to compute statistics for {}/{}: {}",
                        project_name,
                        agent_name,
                        e
                    );
                }
                StatisticsResult::empty(project_name, agent_name, StatisticsPeriod::new(start, end))
            }
        }
    }

    pub fn try_get_statistics(
        &self,
        project_name: &str,
        agent_name: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<StatisticsResult> {
        if project_name.trim().is_empty() || agent_name.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "project_name and agent_name are required".to_string(),
            ));
        }

        let mut stats =
            StatisticsResult::empty(project_name, agent_name, StatisticsPeriod::new(start, end));
        let scope = Scope {
            project_name: Some(project_name),
            agent_name: Some(agent_name),
            session_id: None,
            start,
            end,
        };
        if scope.is_empty_range() {
            return Ok(stats);
        }
        let filter = scope.to_filter();

        stats.total_interactions = self.collection.count_documents(&filter)?;
        stats.interaction_types = self.count_by(&filter, fields::INTERACTION_TYPE)?;
        stats.task_statuses = self.count_by(&filter.clone().exists(fields::STATUS), fields::STATUS)?;
        stats.average_execution_time_ms = self.average_execution_time(&filter)?;

        debug!(
            target: "toolhub::interactions",
            "Statistics for {}/{}: {} interactions",
            project_name,
            agent_name,
            stats.total_interactions
        );
        Ok(stats)
    }

    fn count_by(&self, filter: &Filter, field: &str) -> Result<BTreeMap<String, u64>> {
        let groups = self.collection.aggregate(&[
            Stage::Match(filter.clone()),
            Stage::group_by(field).accumulate(COUNT, Accumulator::Count).build(),
        ])?;

        let mut counts = BTreeMap::new();
        for group in &groups {
            let key = group.get(GROUP_KEY).map(group_label).unwrap_or_else(|| "null".to_string());
            let count = group.get_i64(COUNT).unwrap_or(0).max(0) as u64;
            *counts.entry(key).or_insert(0) += count;
        }
        Ok(counts)
    }

    fn average_execution_time(&self, filter: &Filter) -> Result<Option<f64>> {
        let groups = self.collection.aggregate(&[
            Stage::Match(filter.clone().exists(fields::EXECUTION_TIME_MS)),
            Stage::group_all()
                .accumulate(AVERAGE, Accumulator::Avg(fields::EXECUTION_TIME_MS.to_string()))
                .build(),
        ])?;
        Ok(groups.first().and_then(|g: &Document| g.get_f64(AVERAGE)))
    }
}

/// Plain-string form of a group key.
fn group_label(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Double(d) => d.to_string(),
        other => other.to_json().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::testing::{FailingCollection, memory_log};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;
    use toolhub_types::NewInteraction;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 9, 0, 0).unwrap()
    }

    fn entry(kind: &str, status: Option<&str>, ms: Option<f64>, minutes: i64) -> NewInteraction {
        let mut new = NewInteraction::new("atlas", "planner", kind);
        new.status = status.map(str::to_string);
        new.execution_time_ms = ms;
        new.timestamp = Some(t0() + Duration::minutes(minutes));
        new
    }

    #[test]
    fn test_statistics_over_mixed_records() {
        let log = memory_log();
        for new in [
            entry("task", Some("completed"), Some(100.0), 0),
            entry("task", Some("failed"), Some(200.0), 1),
            entry("chat", None, None, 2),
            entry("task", Some("completed"), Some(300.0), 3),
        ] {
            assert!(log.log_interaction(new));
        }
        // Another agent in the same project stays out of scope.
        let mut other = entry("task", Some("failed"), Some(5000.0), 4);
        other.agent_name = "coder".to_string();
        assert!(log.log_interaction(other));

        let stats = log.get_statistics("atlas", "planner", None, None);
        assert_eq!(stats.total_interactions, 4);
        assert_eq!(stats.interaction_types.get("task"), Some(&3));
        assert_eq!(stats.interaction_types.get("chat"), Some(&1));
        assert_eq!(stats.task_statuses.get("completed"), Some(&2));
        assert_eq!(stats.task_statuses.get("failed"), Some(&1));
        assert_eq!(stats.task_statuses.len(), 2);
        assert_eq!(stats.average_execution_time_ms, Some(200.0));
        assert_eq!(stats.period, StatisticsPeriod::default());
    }

    #[test]
    fn test_statistics_respect_period() {
        let log = memory_log();
        for minutes in 0..5 {
            assert!(log.log_interaction(entry("chat", None, Some(10.0 * minutes as f64), minutes)));
        }

        let start = t0() + Duration::minutes(1);
        let end = t0() + Duration::minutes(3);
        let stats = log.get_statistics("atlas", "planner", Some(start), Some(end));
        assert_eq!(stats.total_interactions, 3);
        assert_eq!(stats.average_execution_time_ms, Some(20.0));
        assert_eq!(stats.period.start_date.as_deref(), Some("2025-08-01T09:01:00.000000Z"));
        assert_eq!(stats.period.end_date.as_deref(), Some("2025-08-01T09:03:00.000000Z"));
    }

    #[test]
    fn test_no_data_has_no_average() {
        let log = memory_log();
        assert!(log.log_interaction(entry("chat", None, None, 0)));

        let stats = log.get_statistics("atlas", "planner", None, None);
        assert_eq!(stats.total_interactions, 1);
        assert!(stats.task_statuses.is_empty());
        assert_eq!(stats.average_execution_time_ms, None);

        let empty = log.get_statistics("atlas", "nobody", None, None);
        assert_eq!(empty.total_interactions, 0);
        assert!(empty.interaction_types.is_empty());
        assert_eq!(empty.average_execution_time_ms, None);
    }

    #[test]
    fn test_store_failure_yields_zero_result() {
        let failing = Arc::new(FailingCollection::default());
        let log = InteractionLog::new(failing.clone());
        let start = t0();

        let stats = log.get_statistics("atlas", "planner", Some(start), None);
        assert_eq!(stats.project_name, "atlas");
        assert_eq!(stats.total_interactions, 0);
        assert!(stats.interaction_types.is_empty());
        assert_eq!(stats.average_execution_time_ms, None);
        assert_eq!(stats.period.start_date.as_deref(), Some("2025-08-01T09:00:00.000000Z"));
        assert!(stats.period.end_date.is_none());
        // The first failing pass ends the computation.
        assert_eq!(failing.call_count(), 1);
    }

    #[test]
    fn test_blank_scope_is_rejected() {
        let log = memory_log();
        assert!(log.try_get_statistics("", "planner", None, None).is_err());
        assert_eq!(log.get_statistics("atlas", " ", None, None).total_interactions, 0);
    }

    #[test]
    fn test_group_label() {
        assert_eq!(group_label(&Value::from("done")), "done");
        assert_eq!(group_label(&Value::Int(3)), "3");
        assert_eq!(group_label(&Value::Null), "null");
    }
}
