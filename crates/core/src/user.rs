//! Acting users and their capabilities.

use std::collections::BTreeSet;

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::db::{Database, StoreError};
use crate::forum::Forum;

/// May attach a poll to a new thread.
pub const FORUMS_POLLS_CREATE: &str = "forums_polls_create";
/// May use the SQL sandbox.
pub const ADMIN_SITE_DEBUG: &str = "admin_site_debug";
/// May delete collages owned by others.
pub const SITE_COLLAGES_DELETE: &str = "site_collages_delete";
/// May recover deleted collages.
pub const SITE_COLLAGES_RECOVER: &str = "site_collages_recover";

/// The user a request acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Viewer {
    pub id: u32,
    pub username: String,
    pub class_level: u32,
    pub disable_posting: bool,
    pub permissions: BTreeSet<String>,
}

impl Viewer {
    pub fn permitted(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn read_access(&self, forum: &Forum) -> bool {
        self.class_level >= forum.min_class_read
    }

    pub fn write_access(&self, forum: &Forum) -> bool {
        self.read_access(forum) && self.class_level >= forum.min_class_write
    }

    pub fn create_access(&self, forum: &Forum) -> bool {
        self.write_access(forum) && self.class_level >= forum.min_class_create
    }
}

/// Loads and creates user rows.
pub struct UserManager {
    db: Database,
}

impl UserManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn find_by_id(&self, id: u32) -> Result<Option<Viewer>, StoreError> {
        let conn = self.db.lock()?;
        let viewer = conn
            .query_row(
                "SELECT id, username, class_level, disable_posting, permissions FROM users WHERE id = ?",
                params![id],
                |row| {
                    let permissions: String = row.get(4)?;
                    Ok(Viewer {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        class_level: row.get(2)?,
                        disable_posting: row.get(3)?,
                        permissions: parse_permissions(&permissions),
                    })
                },
            )
            .optional()?;
        Ok(viewer)
    }

    pub fn create(
        &self,
        username: &str,
        class_level: u32,
        permissions: &[&str],
    ) -> Result<Viewer, StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO users (username, class_level, permissions) VALUES (?, ?, ?)",
            params![username, class_level, permissions.join(",")],
        )?;
        let id = conn.last_insert_rowid() as u32;
        Ok(Viewer {
            id,
            username: username.to_string(),
            class_level,
            disable_posting: false,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        })
    }

    pub fn set_posting_disabled(&self, id: u32, disabled: bool) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "UPDATE users SET disable_posting = ? WHERE id = ?",
            params![disabled, id],
        )?;
        Ok(())
    }
}

fn parse_permissions(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
