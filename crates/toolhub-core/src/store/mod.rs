//! Document store boundary.
//!
//! The interaction services talk to a document collection through the
//! [`DocumentCollection`] trait: single inserts, filtered finds with sort and
//! limit, counts, and a small aggregation pipeline (`Match` then `Group`).
//!
//! Implementations:
//! - [`Collection`]: a named collection on a shared [`DocumentClient`]
//!   (SQLite with its JSON functions as the document engine)

mod codec;
mod sqlite;

pub use sqlite::{Collection, DocumentClient};

use crate::Result;
use toolhub_types::{Document, ObjectId, Value};

/// A predicate on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value. `Null` also matches a missing field.
    Eq(Value),
    /// Inclusive bounds; a missing side is open.
    Range {
        gte: Option<Value>,
        lte: Option<Value>,
    },
    /// Field is present with a non-null value (`true`) or is not (`false`).
    Exists(bool),
}

/// Conjunction of per-field conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    /// Match-all filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Eq(value.into())));
        self
    }

    /// Bound a field inclusively. With both sides `None` the filter is unchanged.
    pub fn range(mut self, field: &str, gte: Option<Value>, lte: Option<Value>) -> Self {
        if gte.is_some() || lte.is_some() {
            self.conditions
                .push((field.to_string(), Condition::Range { gte, lte }));
        }
        self
    }

    pub fn exists(mut self, field: &str) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Exists(true)));
        self
    }

    pub fn missing(mut self, field: &str) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Exists(false)));
        self
    }

    /// Conjunction of both filters.
    pub fn and(mut self, other: &Filter) -> Self {
        self.conditions.extend(other.conditions.iter().cloned());
        self
    }

    pub fn conditions(&self) -> &[(String, Condition)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Options for [`DocumentCollection::find`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<(String, SortOrder)>,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn sorted(field: &str, order: SortOrder) -> Self {
        Self {
            sort: Some((field.to_string(), order)),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Grouping key of a `Group` stage.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// One group over every matched document.
    Null,
    /// One group per distinct value of the field.
    Field(String),
}

/// Accumulator of a `Group` stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Number of documents in the group (`$sum: 1`).
    Count,
    /// Sum of the numeric values of a field.
    Sum(String),
    /// Mean of the numeric values of a field; null when none are numeric.
    Avg(String),
}

/// One stage of an aggregation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    Group {
        key: GroupKey,
        accumulators: Vec<(String, Accumulator)>,
    },
}

impl Stage {
    pub fn group_by(field: &str) -> StageBuilder {
        StageBuilder {
            key: GroupKey::Field(field.to_string()),
            accumulators: Vec::new(),
        }
    }

    pub fn group_all() -> StageBuilder {
        StageBuilder {
            key: GroupKey::Null,
            accumulators: Vec::new(),
        }
    }
}

/// Builder for `Group` stages.
#[derive(Debug, Clone)]
pub struct StageBuilder {
    key: GroupKey,
    accumulators: Vec<(String, Accumulator)>,
}

impl StageBuilder {
    pub fn accumulate(mut self, output: &str, accumulator: Accumulator) -> Self {
        self.accumulators.push((output.to_string(), accumulator));
        self
    }

    pub fn build(self) -> Stage {
        Stage::Group {
            key: self.key,
            accumulators: self.accumulators,
        }
    }
}

/// A named collection of documents.
///
/// Implementations must be safe to share across threads; a single handle is
/// shared by every service for the lifetime of the process.
pub trait DocumentCollection: Send + Sync {
    /// Collection name.
    fn name(&self) -> &str;

    /// Insert one document and return its store-assigned identifier.
    ///
    /// An `_id` holding an [`ObjectId`] is kept; any other `_id` is replaced.
    fn insert_one(&self, doc: Document) -> Result<ObjectId>;

    /// Documents matching `filter`, each carrying its `_id`.
    fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>>;

    /// Number of documents matching `filter`.
    fn count_documents(&self, filter: &Filter) -> Result<u64>;

    /// Run a pipeline of `Match` stages followed by at most one `Group`.
    ///
    /// Group output documents carry the group key under `_id` and one entry per
    /// accumulator. An empty input produces no groups.
    fn aggregate(&self, pipeline: &[Stage]) -> Result<Vec<Document>>;
}
