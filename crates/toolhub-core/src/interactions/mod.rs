//! Interaction logging and analytics.
//!
//! [`InteractionLog`] is the single entry point for the three operations on the
//! interaction collection:
//! - ingestion ([`InteractionLog::log_interaction`])
//! - filtered retrieval ([`InteractionLog::get_logs`])
//! - aggregate statistics ([`InteractionLog::get_statistics`])
//!
//! Each operation has an infallible form that logs failures and degrades to
//! `false`, an empty list, or a zero-valued result, and a `try_` form that
//! returns the [`StoreError`](crate::StoreError) instead.

mod ingest;
mod query;
mod stats;

use crate::store::{DocumentCollection, Filter};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use toolhub_types::{Value, fields};

/// Logging and analytics over one interaction collection.
#[derive(Clone)]
pub struct InteractionLog {
    collection: Arc<dyn DocumentCollection>,
}

impl InteractionLog {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self { collection }
    }

    /// Name of the backing collection.
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }
}

/// Criteria shared by queries and statistics. Empty strings impose nothing.
#[derive(Debug, Default)]
struct Scope<'a> {
    project_name: Option<&'a str>,
    agent_name: Option<&'a str>,
    session_id: Option<&'a str>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl Scope<'_> {
    fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();
        for (field, value) in [
            (fields::PROJECT_NAME, self.project_name),
            (fields::AGENT_NAME, self.agent_name),
            (fields::SESSION_ID, self.session_id),
        ] {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                filter = filter.eq(field, value);
            }
        }
        filter.range(
            fields::TIMESTAMP,
            self.start.map(Value::from),
            self.end.map(Value::from),
        )
    }

    /// Inverted bounds match nothing.
    fn is_empty_range(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start > end)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::{DocumentClient, FindOptions, Stage};
    use crate::{Result, StoreError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use toolhub_types::{Document, ObjectId};

    /// Log over a fresh in-memory store.
    pub fn memory_log() -> InteractionLog {
        let client = Arc::new(DocumentClient::open_in_memory().unwrap());
        InteractionLog::new(Arc::new(client.collection("agents_logs")))
    }

    /// Collection whose every operation fails, counting the attempts.
    #[derive(Default)]
    pub struct FailingCollection {
        pub calls: AtomicUsize,
    }

    impl FailingCollection {
        fn fail<T>(&self) -> Result<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DocumentCollection for FailingCollection {
        fn name(&self) -> &str {
            "failing"
        }

        fn insert_one(&self, _doc: Document) -> Result<ObjectId> {
            self.fail()
        }

        fn find(&self, _filter: &Filter, _options: &FindOptions) -> Result<Vec<Document>> {
            self.fail()
        }

        fn count_documents(&self, _filter: &Filter) -> Result<u64> {
            self.fail()
        }

        fn aggregate(&self, _pipeline: &[Stage]) -> Result<Vec<Document>> {
            self.fail()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Condition;
    use chrono::TimeZone;

    #[test]
    fn test_scope_skips_absent_and_empty_criteria() {
        let scope = Scope {
            project_name: Some("atlas"),
            agent_name: Some(""),
            ..Default::default()
        };
        assert_eq!(
            scope.to_filter().conditions(),
            &[(
                fields::PROJECT_NAME.to_string(),
                Condition::Eq(Value::from("atlas"))
            )]
        );
    }

    #[test]
    fn test_scope_bounds_timestamp() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let scope = Scope {
            start: Some(start),
            ..Default::default()
        };
        assert_eq!(
            scope.to_filter().conditions(),
            &[(
                fields::TIMESTAMP.to_string(),
                Condition::Range {
                    gte: Some(Value::from(start)),
                    lte: None
                }
            )]
        );
        assert!(!scope.is_empty_range());
    }

    #[test]
    fn test_inverted_range() {
        let scope = Scope {
            start: Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(scope.is_empty_range());
    }
}
