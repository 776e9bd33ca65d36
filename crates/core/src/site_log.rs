//! Administrative site log.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::db::{parse_timestamp, timestamp, Database, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteLogEntry {
    pub id: u32,
    pub message: String,
    pub time: DateTime<Utc>,
}

/// Append a line using a connection the caller already holds.
pub(crate) fn append(conn: &Connection, message: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO site_log (message, time) VALUES (?, ?)",
        params![message, timestamp(Utc::now())],
    )?;
    Ok(())
}

pub struct SiteLog {
    db: Database,
}

impl SiteLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn general(&self, message: &str) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        append(&conn, message)?;
        Ok(())
    }

    /// Newest entries first.
    pub fn recent(&self, limit: u32) -> Result<Vec<SiteLogEntry>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, message, time FROM site_log ORDER BY id DESC LIMIT ?")?;
        let rows = stmt.query_map(params![limit], |row| {
            let time: String = row.get(2)?;
            Ok(SiteLogEntry {
                id: row.get(0)?,
                message: row.get(1)?,
                time: parse_timestamp(&time).unwrap_or_else(Utc::now),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
