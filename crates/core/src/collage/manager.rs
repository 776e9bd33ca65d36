use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{Collage, CollageCategory, CollageError, CollageRef, NewCollage};
use crate::cache::Cache;
use crate::db::{parse_timestamp, timestamp, Database};
use crate::metrics;
use crate::query::Membership;
use crate::site_log;
use crate::user::{Viewer, SITE_COLLAGES_DELETE, SITE_COLLAGES_RECOVER};

pub(super) const COLLAGE_COLUMNS: &str = "c.id, c.name, c.description, c.tag_list, c.user_id, \
     c.category_id, c.locked, c.deleted, c.num_torrents, c.created, c.updated";

/// Collage lifecycle, membership, suggestions and subscriptions.
pub struct CollageManager {
    pub(super) db: Database,
    pub(super) cache: Arc<dyn Cache>,
}

impl CollageManager {
    pub fn new(db: Database, cache: Arc<dyn Cache>) -> Self {
        Self { db, cache }
    }

    /// Create a collage owned by `user` and record it in the site log.
    ///
    /// Names must be unique across all collages, deleted ones included.
    pub fn create(&self, user: &Viewer, new: NewCollage) -> Result<Collage, CollageError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(CollageError::Validation(
                "You must enter a collage name.".to_string(),
            ));
        }
        if let Some(existing) = self.exists(name)? {
            return Err(CollageError::Duplicate {
                name: name.to_string(),
                existing,
            });
        }

        let now = timestamp(Utc::now());
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO collages (user_id, category_id, name, description, tag_list, created, updated)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                user.id,
                new.category.id(),
                name,
                new.description.trim(),
                new.tag_list.trim(),
                now,
                now
            ],
        )?;
        let id = tx.last_insert_rowid() as u32;
        site_log::append(
            &tx,
            &format!("Collage {} ({}) was created by {}", id, name, user.username),
        )?;
        tx.commit()?;

        metrics::COLLAGES_CREATED.inc();
        info!(collage_id = id, user_id = user.id, name, "Collage created");

        Self::load(&conn, id)?
            .ok_or_else(|| CollageError::NotFound(format!("Collage {} not found", id)))
    }

    /// Id and deleted state of any collage with this name.
    pub fn exists(&self, name: &str) -> Result<Option<CollageRef>, CollageError> {
        let conn = self.db.lock()?;
        let found = conn
            .query_row(
                "SELECT id, deleted FROM collages WHERE name = ? ORDER BY id LIMIT 1",
                params![name.trim()],
                |row| {
                    Ok(CollageRef {
                        id: row.get(0)?,
                        deleted: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    pub fn find_by_id(&self, id: u32) -> Result<Option<Collage>, CollageError> {
        let conn = self.db.lock()?;
        Ok(Self::load(&conn, id)?)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Collage>, CollageError> {
        let conn = self.db.lock()?;
        let collage = conn
            .query_row(
                &format!(
                    "SELECT {} FROM collages c WHERE c.name = ? ORDER BY c.id LIMIT 1",
                    COLLAGE_COLUMNS
                ),
                params![name],
                Self::row_to_collage,
            )
            .optional()?;
        Ok(collage)
    }

    /// Flag a collage as deleted. The row is kept.
    ///
    /// Only the owner or a holder of `site_collages_delete` may delete.
    pub fn soft_delete(&self, viewer: &Viewer, id: u32) -> Result<(), CollageError> {
        let conn = self.db.lock()?;
        let collage = Self::load(&conn, id)?
            .ok_or_else(|| CollageError::NotFound(format!("Collage {} not found", id)))?;
        if collage.user_id != viewer.id && !viewer.permitted(SITE_COLLAGES_DELETE) {
            return Err(CollageError::Forbidden(
                "You are not allowed to delete this collage.".to_string(),
            ));
        }
        conn.execute(
            "UPDATE collages SET deleted = 1, updated = ? WHERE id = ?",
            params![timestamp(Utc::now()), id],
        )?;
        info!(collage_id = id, user_id = viewer.id, "Collage deleted");
        Ok(())
    }

    pub fn recover_by_id(&self, viewer: &Viewer, id: u32) -> Result<Option<Collage>, CollageError> {
        check_recover(viewer)?;
        let conn = self.db.lock()?;
        let found: Option<u32> = conn
            .query_row("SELECT id FROM collages WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        match found {
            Some(id) => Self::recover(&conn, id),
            None => Ok(None),
        }
    }

    pub fn recover_by_name(&self, viewer: &Viewer, name: &str) -> Result<Option<Collage>, CollageError> {
        check_recover(viewer)?;
        let conn = self.db.lock()?;
        let found: Option<u32> = conn
            .query_row(
                "SELECT id FROM collages WHERE name = ? ORDER BY id LIMIT 1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        match found {
            Some(id) => Self::recover(&conn, id),
            None => Ok(None),
        }
    }

    fn recover(conn: &Connection, id: u32) -> Result<Option<Collage>, CollageError> {
        conn.execute("UPDATE collages SET deleted = 0 WHERE id = ?", params![id])?;
        info!(collage_id = id, "Collage recovered");
        Ok(Self::load(conn, id)?)
    }

    /// First unused name of the form "{user}'s personal collage", then "... no. 2" and so on.
    pub fn personal_collage_name(&self, username: &str) -> Result<String, CollageError> {
        let conn = self.db.lock()?;
        let base = format!("{}'s personal collage", username);
        let mut candidate = base.clone();
        let mut n = 1;
        loop {
            let taken: bool = conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM collages WHERE name = ?)",
                params![candidate],
                |row| row.get(0),
            )?;
            if !taken {
                return Ok(candidate);
            }
            n += 1;
            candidate = format!("{} no. {}", base, n);
        }
    }

    pub fn add_group(&self, collage_id: u32, group_id: u32, user_id: u32) -> Result<(), CollageError> {
        self.add_member(Membership::Group, collage_id, group_id, user_id, Utc::now())
    }

    pub fn add_artist(
        &self,
        collage_id: u32,
        artist_id: u32,
        user_id: u32,
    ) -> Result<(), CollageError> {
        self.add_member(Membership::Artist, collage_id, artist_id, user_id, Utc::now())
    }

    pub(super) fn add_member(
        &self,
        membership: Membership,
        collage_id: u32,
        entity_id: u32,
        user_id: u32,
        at: DateTime<Utc>,
    ) -> Result<(), CollageError> {
        {
            let mut conn = self.db.lock()?;
            let collage = match Self::load(&conn, collage_id)? {
                Some(c) if !c.deleted => c,
                _ => {
                    return Err(CollageError::NotFound(format!(
                        "Collage {} not found",
                        collage_id
                    )))
                }
            };
            if collage.locked {
                return Err(CollageError::Forbidden("This collage is locked.".to_string()));
            }
            let wants_artists = membership == Membership::Artist;
            if collage.category.holds_artists() != wants_artists {
                return Err(CollageError::Validation(if wants_artists {
                    "Artists can only be added to artist collages.".to_string()
                } else {
                    "Release groups cannot be added to artist collages.".to_string()
                }));
            }

            let entity_table = match membership {
                Membership::Group => "torrent_groups",
                Membership::Artist => "artists",
            };
            let entity_exists: bool = conn.query_row(
                &format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = ?)", entity_table),
                params![entity_id],
                |row| row.get(0),
            )?;
            if !entity_exists {
                return Err(CollageError::NotFound(match membership {
                    Membership::Group => format!("Torrent group {} not found", entity_id),
                    Membership::Artist => format!("Artist {} not found", entity_id),
                }));
            }

            let present: bool = conn.query_row(
                &format!(
                    "SELECT EXISTS (SELECT 1 FROM {} WHERE collage_id = ? AND {} = ?)",
                    membership.table(),
                    membership.entity_column()
                ),
                params![collage_id, entity_id],
                |row| row.get(0),
            )?;
            if present {
                return Err(CollageError::Validation(match membership {
                    Membership::Group => "This release group is already in the collage.",
                    Membership::Artist => "This artist is already in the collage.",
                }
                .to_string()));
            }

            let added_on = timestamp(at);
            let tx = conn.transaction()?;
            tx.execute(
                &format!(
                    "INSERT INTO {table} (collage_id, {column}, user_id, sort, added_on)
                     SELECT ?1, ?2, ?3, COALESCE(MAX(sort), 0) + 10, ?4 FROM {table} WHERE collage_id = ?1",
                    table = membership.table(),
                    column = membership.entity_column()
                ),
                params![collage_id, entity_id, user_id, added_on],
            )?;
            tx.execute(
                "UPDATE collages SET num_torrents = num_torrents + 1, updated = ? WHERE id = ?",
                params![added_on, collage_id],
            )?;
            tx.commit()?;
        }

        debug!(collage_id, entity_id, user_id, ?membership, "Collage entry added");
        match membership {
            Membership::Group => self.flush_group_suggestions(user_id),
            Membership::Artist => self.flush_artist_suggestions(user_id),
        }
        Ok(())
    }

    pub(super) fn load(conn: &Connection, id: u32) -> rusqlite::Result<Option<Collage>> {
        conn.query_row(
            &format!("SELECT {} FROM collages c WHERE c.id = ?", COLLAGE_COLUMNS),
            params![id],
            Self::row_to_collage,
        )
        .optional()
    }

    fn row_to_collage(row: &rusqlite::Row) -> rusqlite::Result<Collage> {
        let category_id: u32 = row.get(5)?;
        let category = CollageCategory::from_id(category_id).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Integer,
                format!("unknown collage category {}", category_id).into(),
            )
        })?;
        let created: String = row.get(9)?;
        let updated: String = row.get(10)?;

        Ok(Collage {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            tag_list: row.get(3)?,
            user_id: row.get(4)?,
            category,
            locked: row.get(6)?,
            deleted: row.get(7)?,
            num_torrents: row.get(8)?,
            created: parse_timestamp(&created).unwrap_or_else(Utc::now),
            updated: parse_timestamp(&updated).unwrap_or_else(Utc::now),
        })
    }
}

fn check_recover(viewer: &Viewer) -> Result<(), CollageError> {
    if viewer.permitted(SITE_COLLAGES_RECOVER) {
        Ok(())
    } else {
        Err(CollageError::Forbidden(
            "You are not allowed to recover collages.".to_string(),
        ))
    }
}
