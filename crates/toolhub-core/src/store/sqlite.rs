//! SQLite-backed document client.
//!
//! Every collection lives in one `documents` table, keyed by collection name.
//! Filters, sorts and groups are compiled to SQL over the JSON bodies using
//! SQLite's JSON functions.

use super::codec::{DATE_KEY, OID_KEY, decode_document, encode_document};
use super::{
    Accumulator, Condition, DocumentCollection, Filter, FindOptions, GroupKey, SortOrder, Stage,
};
use crate::{Result, StoreError};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params, params_from_iter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use toolhub_types::{Document, ObjectId, Value, format_instant};
use tracing::{debug, error, info};

const ID_KEY: &str = "_id";

static FIELD_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

enum ClientState {
    Connected(Mutex<Connection>),
    Unavailable(String),
}

/// Process-wide handle to the document database.
///
/// Construct once at startup and share through an `Arc`; collections are cheap
/// handles onto it.
pub struct DocumentClient {
    state: ClientState,
}

impl DocumentClient {
    /// Connect to the database at `path`.
    ///
    /// A failure is logged, not returned: the client comes up unavailable and
    /// every operation on it fails with [`StoreError::Unavailable`].
    pub fn connect(path: &Path) -> Self {
        match Self::open(path) {
            Ok(client) => {
                info!(target: "toolhub::store", "Connected to document store at {}", path.display());
                client
            }
            Err(e) => {
                error!(
                    target: "toolhub::store",
                    "Failed to connect to document store at {}: {}",
                    path.display(),
                    e
                );
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, creating the schema if needed.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL UNIQUE,
                body TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection
                ON documents(collection);
            "#,
        )?;
        Ok(Self {
            state: ClientState::Connected(Mutex::new(conn)),
        })
    }

    /// A client whose every operation fails with the given reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: ClientState::Unavailable(reason.into()),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ClientState::Connected(_))
    }

    /// Round trip to the database.
    pub fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Handle to a named collection.
    pub fn collection(self: &Arc<Self>, name: &str) -> Collection {
        Collection {
            client: Arc::clone(self),
            name: name.to_string(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        match &self.state {
            ClientState::Connected(conn) => conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string())),
            ClientState::Unavailable(reason) => Err(StoreError::Unavailable(reason.clone())),
        }
    }
}

/// A named collection on a [`DocumentClient`].
#[derive(Clone)]
pub struct Collection {
    client: Arc<DocumentClient>,
    name: String,
}

impl DocumentCollection for Collection {
    fn name(&self) -> &str {
        &self.name
    }

    fn insert_one(&self, mut doc: Document) -> Result<ObjectId> {
        let id = match doc.remove(ID_KEY) {
            Some(Value::ObjectId(id)) => id,
            _ => ObjectId::new(),
        };
        let body = serde_json::to_string(&encode_document(&doc))?;

        let conn = self.client.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![self.name, id.to_hex(), body],
        )?;
        debug!(target: "toolhub::store", "Inserted {} into {}", id, self.name);
        Ok(id)
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>> {
        let mut params = vec![SqlValue::Text(self.name.clone())];
        let where_sql = where_clause(filter, &mut params)?;

        let order_sql = match &options.sort {
            Some((field, order)) => {
                let direction = match order {
                    SortOrder::Ascending => "ASC",
                    SortOrder::Descending => "DESC",
                };
                format!("{} {}, seq ASC", sort_expr(field)?, direction)
            }
            None => "seq ASC".to_string(),
        };

        let mut sql = format!("SELECT id, body FROM documents WHERE {where_sql} ORDER BY {order_sql}");
        if let Some(limit) = options.limit {
            sql.push_str(" LIMIT ?");
            params.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        let rows = {
            let conn = self.client.lock()?;
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let mut docs = Vec::with_capacity(rows.len());
        for (id, body) in rows {
            let mut doc = decode_document(serde_json::from_str(&body)?);
            match id.parse::<ObjectId>() {
                Ok(oid) => doc.insert(ID_KEY, oid),
                Err(_) => doc.insert(ID_KEY, id),
            };
            docs.push(doc);
        }
        debug!(target: "toolhub::store", "Found {} documents in {}", docs.len(), self.name);
        Ok(docs)
    }

    fn count_documents(&self, filter: &Filter) -> Result<u64> {
        let mut params = vec![SqlValue::Text(self.name.clone())];
        let where_sql = where_clause(filter, &mut params)?;
        let sql = format!("SELECT COUNT(*) FROM documents WHERE {where_sql}");

        let conn = self.client.lock()?;
        let count: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn aggregate(&self, pipeline: &[Stage]) -> Result<Vec<Document>> {
        let mut filter = Filter::new();
        let mut group = None;
        for stage in pipeline {
            match stage {
                Stage::Match(f) if group.is_none() => filter = filter.and(f),
                Stage::Match(_) => {
                    return Err(StoreError::UnsupportedPipeline(
                        "match after group".to_string(),
                    ));
                }
                Stage::Group { key, accumulators } if group.is_none() => {
                    group = Some((key, accumulators))
                }
                Stage::Group { .. } => {
                    return Err(StoreError::UnsupportedPipeline(
                        "more than one group stage".to_string(),
                    ));
                }
            }
        }

        let Some((key, accumulators)) = group else {
            return self.find(&filter, &FindOptions::default());
        };

        let mut params = vec![SqlValue::Text(self.name.clone())];
        let where_sql = where_clause(&filter, &mut params)?;

        let (key_sql, group_by) = match key {
            GroupKey::Null => ("NULL".to_string(), String::new()),
            GroupKey::Field(field) => {
                let expr = group_key_expr(field)?;
                let group_by = format!(" GROUP BY {expr}");
                (expr, group_by)
            }
        };

        let mut columns = vec![key_sql, "COUNT(*)".to_string()];
        for (_, accumulator) in accumulators.iter() {
            columns.push(accumulator_sql(accumulator)?);
        }
        let sql = format!(
            "SELECT {} FROM documents WHERE {where_sql}{group_by}",
            columns.join(", ")
        );

        let conn = self.client.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let count: i64 = row.get(1)?;
                let mut doc = Document::new();
                doc.insert(ID_KEY, from_sql(row.get(0)?));
                for (i, (output, accumulator)) in accumulators.iter().enumerate() {
                    let value = match accumulator {
                        Accumulator::Count => Value::Int(row.get(i + 2)?),
                        _ => from_sql(row.get(i + 2)?),
                    };
                    doc.insert(output.as_str(), value);
                }
                Ok((count, doc))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // An ungrouped aggregate over nothing still yields one SQL row.
        Ok(rows
            .into_iter()
            .filter(|(count, _)| *count > 0)
            .map(|(_, doc)| doc)
            .collect())
    }
}

fn json_path(field: &str) -> Result<String> {
    if FIELD_NAME.is_match(field) {
        Ok(format!("$.{field}"))
    } else {
        Err(StoreError::InvalidField(field.to_string()))
    }
}

fn extract(path: &str) -> String {
    format!("json_extract(body, '{path}')")
}

fn extract_native(path: &str, key: &str) -> String {
    format!("json_extract(body, '{path}.\"{key}\"')")
}

fn json_type(path: &str) -> String {
    format!("COALESCE(json_type(body, '{path}'), 'null')")
}

fn sort_expr(field: &str) -> Result<String> {
    if field == ID_KEY {
        return Ok("id".to_string());
    }
    let path = json_path(field)?;
    Ok(format!(
        "COALESCE({}, {})",
        extract_native(&path, DATE_KEY),
        extract(&path)
    ))
}

fn group_key_expr(field: &str) -> Result<String> {
    if field == ID_KEY {
        return Ok("id".to_string());
    }
    let path = json_path(field)?;
    Ok(format!(
        "COALESCE({}, {}, {})",
        extract_native(&path, OID_KEY),
        extract_native(&path, DATE_KEY),
        extract(&path)
    ))
}

fn numeric_only(path: &str) -> String {
    format!(
        "CASE WHEN {} IN ('integer', 'real') THEN {} END",
        json_type(path),
        extract(path)
    )
}

fn accumulator_sql(accumulator: &Accumulator) -> Result<String> {
    Ok(match accumulator {
        Accumulator::Count => "COUNT(*)".to_string(),
        Accumulator::Sum(field) => format!("COALESCE(SUM({}), 0)", numeric_only(&json_path(field)?)),
        Accumulator::Avg(field) => format!("AVG({})", numeric_only(&json_path(field)?)),
    })
}

fn where_clause(filter: &Filter, params: &mut Vec<SqlValue>) -> Result<String> {
    let mut clauses = vec!["collection = ?".to_string()];
    for (field, condition) in filter.conditions() {
        clauses.push(format!("({})", condition_sql(field, condition, params)?));
    }
    Ok(clauses.join(" AND "))
}

fn unsupported(field: &str, reason: &str) -> StoreError {
    StoreError::UnsupportedFilter {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn condition_sql(field: &str, condition: &Condition, params: &mut Vec<SqlValue>) -> Result<String> {
    if field == ID_KEY {
        return id_condition_sql(condition, params);
    }
    let path = json_path(field)?;

    match condition {
        Condition::Exists(true) => Ok(format!("{} != 'null'", json_type(&path))),
        Condition::Exists(false) => Ok(format!("{} = 'null'", json_type(&path))),
        Condition::Eq(value) => match value {
            Value::Null => Ok(format!("{} = 'null'", json_type(&path))),
            Value::Bool(b) => Ok(format!("{} = '{}'", json_type(&path), b)),
            Value::Int(i) => {
                params.push(SqlValue::Integer(*i));
                Ok(format!("{} = ?", extract(&path)))
            }
            Value::Double(_) | Value::UInt(_) => {
                params.push(SqlValue::Real(value.as_f64().unwrap_or_default()));
                Ok(format!("{} = ?", extract(&path)))
            }
            Value::String(s) => {
                params.push(SqlValue::Text(s.clone()));
                Ok(format!("{} = 'text' AND {} = ?", json_type(&path), extract(&path)))
            }
            Value::DateTime(dt) => {
                params.push(SqlValue::Text(format_instant(dt)));
                Ok(format!("{} = ?", extract_native(&path, DATE_KEY)))
            }
            Value::ObjectId(id) => {
                params.push(SqlValue::Text(id.to_hex()));
                Ok(format!("{} = ?", extract_native(&path, OID_KEY)))
            }
            Value::Array(_) | Value::Document(_) => {
                Err(unsupported(field, "equality on arrays and documents"))
            }
        },
        Condition::Range { gte, lte } => {
            let mut parts = Vec::new();
            for (op, bound) in [(">=", gte), ("<=", lte)] {
                let Some(bound) = bound else { continue };
                match bound {
                    Value::DateTime(dt) => {
                        params.push(SqlValue::Text(format_instant(dt)));
                        parts.push(format!("{} {op} ?", extract_native(&path, DATE_KEY)));
                    }
                    Value::Int(_) | Value::UInt(_) | Value::Double(_) => {
                        params.push(match bound {
                            Value::Int(i) => SqlValue::Integer(*i),
                            other => SqlValue::Real(other.as_f64().unwrap_or_default()),
                        });
                        parts.push(format!(
                            "{} IN ('integer', 'real') AND {} {op} ?",
                            json_type(&path),
                            extract(&path)
                        ));
                    }
                    Value::String(s) => {
                        params.push(SqlValue::Text(s.clone()));
                        parts.push(format!(
                            "{} = 'text' AND {} {op} ?",
                            json_type(&path),
                            extract(&path)
                        ));
                    }
                    _ => return Err(unsupported(field, "range bound must be an instant, number or string")),
                }
            }
            if parts.is_empty() {
                Ok("1".to_string())
            } else {
                Ok(parts.join(" AND "))
            }
        }
    }
}

fn id_condition_sql(condition: &Condition, params: &mut Vec<SqlValue>) -> Result<String> {
    match condition {
        Condition::Eq(Value::ObjectId(id)) => {
            params.push(SqlValue::Text(id.to_hex()));
            Ok("id = ?".to_string())
        }
        Condition::Eq(Value::String(s)) => {
            params.push(SqlValue::Text(s.clone()));
            Ok("id = ?".to_string())
        }
        Condition::Exists(exists) => Ok(if *exists { "1" } else { "0" }.to_string()),
        _ => Err(unsupported(ID_KEY, "only equality and existence")),
    }
}

fn from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Int(i),
        SqlValue::Real(d) => Value::Double(d),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(_) => Value::Null,
    }
}
