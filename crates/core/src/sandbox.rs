//! Admin SQL sandbox: run read-only queries against the live store.
//!
//! Query errors from the store are part of the result, not failures of the
//! request.

use std::time::Instant;

use base64::{prelude::BASE64_STANDARD, Engine};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::{Database, StoreError};
use crate::metrics;
use crate::user::{Viewer, ADMIN_SITE_DEBUG};

const MIN_EDITOR_ROWS: usize = 8;

/// Statements allowed through: `SHOW ...`, `SELECT ... FROM` and `EXPLAIN SELECT ... FROM`.
static ALLOWED_QUERY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^(?:show(\s+[\w%';]+)+|(?:explain\s+)?select\b(?:[\s\w()<>/.,!`'"=*+-])+\bfrom)"#,
    )
    .unwrap()
});

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("You do not have permission to use the SQL sandbox.")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for SandboxError {
    fn from(e: rusqlite::Error) -> Self {
        SandboxError::Store(e.into())
    }
}

/// What the admin asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxInput {
    /// Nothing: an empty editor.
    Empty,
    /// Base64 query to load into the editor.
    Debug(String),
    /// Load a `SELECT` over every column of this table into the editor.
    Table(String),
    /// Run this query.
    Query(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    /// `None` is SQL NULL.
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SandboxOutcome {
    /// Text for the editor.
    pub query: Option<String>,
    pub editor_rows: usize,
    pub executed: bool,
    pub result: Option<QueryResult>,
    /// Store error message, verbatim.
    pub error: Option<String>,
}

pub struct Sandbox {
    db: Database,
}

impl Sandbox {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn run(&self, viewer: &Viewer, input: SandboxInput) -> Result<SandboxOutcome, SandboxError> {
        if !viewer.permitted(ADMIN_SITE_DEBUG) {
            return Err(SandboxError::Forbidden);
        }

        let query = match input {
            SandboxInput::Empty => {
                return Ok(SandboxOutcome::shown(None));
            }
            SandboxInput::Debug(encoded) => {
                let query = decode_debug(&encoded)?;
                metrics::SANDBOX_QUERIES.with_label_values(&["shown"]).inc();
                return Ok(SandboxOutcome::shown(Some(query)));
            }
            SandboxInput::Table(table) => {
                let conn = self.db.lock()?;
                let query = select_query(&conn, &table)?;
                metrics::SANDBOX_QUERIES.with_label_values(&["shown"]).inc();
                return Ok(SandboxOutcome::shown(Some(query)));
            }
            SandboxInput::Query(query) => query.trim().to_string(),
        };

        if query.is_empty() {
            return Ok(SandboxOutcome::shown(None));
        }
        if !ALLOWED_QUERY.is_match(&query) {
            metrics::SANDBOX_QUERIES.with_label_values(&["rejected"]).inc();
            return Err(SandboxError::Validation("Invalid query".to_string()));
        }

        info!(user_id = viewer.id, query = %query, "Sandbox query");
        let started = Instant::now();
        let outcome = {
            let conn = self.db.lock()?;
            execute(&conn, &query)
        };
        metrics::SANDBOX_DURATION
            .with_label_values(&[])
            .observe(started.elapsed().as_secs_f64());

        let editor_rows = editor_rows(&query);
        Ok(match outcome {
            Ok(result) => {
                metrics::SANDBOX_QUERIES.with_label_values(&["executed"]).inc();
                SandboxOutcome {
                    query: Some(query),
                    editor_rows,
                    executed: true,
                    result: Some(result),
                    error: None,
                }
            }
            Err(e) => {
                metrics::SANDBOX_QUERIES.with_label_values(&["store_error"]).inc();
                warn!(user_id = viewer.id, error = %e, "Sandbox query failed");
                SandboxOutcome {
                    query: Some(query),
                    editor_rows,
                    executed: true,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        })
    }
}

impl SandboxOutcome {
    fn shown(query: Option<String>) -> Self {
        let editor_rows = query.as_deref().map(editor_rows).unwrap_or(MIN_EDITOR_ROWS);
        Self {
            query,
            editor_rows,
            executed: false,
            result: None,
            error: None,
        }
    }
}

/// Height of the editor: enough for the query plus two lines, at least 8.
pub fn editor_rows(query: &str) -> usize {
    MIN_EDITOR_ROWS.max(query.matches('\n').count() + 2)
}

fn decode_debug(encoded: &str) -> Result<String, SandboxError> {
    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|_| SandboxError::Validation("Invalid debug query".to_string()))?;
    String::from_utf8(bytes).map_err(|_| SandboxError::Validation("Invalid debug query".to_string()))
}

/// `SELECT` over every column of `table`, one column per line.
fn select_query(conn: &Connection, table: &str) -> Result<String, SandboxError> {
    let known: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        params![table],
        |row| row.get(0),
    )?;
    if !known {
        return Err(SandboxError::Validation(format!("No such table: {}", table)));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?) ORDER BY cid")?;
    let columns = stmt
        .query_map(params![table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!(
        "SELECT {}\nFROM {}",
        columns.join(",\n    "),
        table
    ))
}

fn execute(conn: &Connection, sql: &str) -> rusqlite::Result<QueryResult> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(match row.get_ref(i)? {
                ValueRef::Null => None,
                ValueRef::Integer(v) => Some(v.to_string()),
                ValueRef::Real(v) => Some(v.to_string()),
                ValueRef::Text(v) | ValueRef::Blob(v) => Some(String::from_utf8_lossy(v).into_owned()),
            });
        }
        rows.push(values);
    }

    Ok(QueryResult { columns, rows })
}
