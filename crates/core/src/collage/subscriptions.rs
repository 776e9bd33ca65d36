//! Collage subscriptions and "new since last visit" listings.

use chrono::{DateTime, Utc};
use rusqlite::params;
use tracing::debug;

use super::manager::CollageManager;
use super::{CollageError, SubscribedCollage};
use crate::db::{parse_timestamp, timestamp};
use crate::query::Membership;

impl CollageManager {
    /// Subscribe `user_id` to a live collage. Subscribing twice is a no-op.
    pub fn subscribe(&self, user_id: u32, collage_id: u32) -> Result<(), CollageError> {
        let conn = self.db.lock()?;
        match Self::load(&conn, collage_id)? {
            Some(c) if !c.deleted => {}
            _ => {
                return Err(CollageError::NotFound(format!(
                    "Collage {} not found",
                    collage_id
                )))
            }
        }
        conn.execute(
            "INSERT OR IGNORE INTO users_collage_subs (user_id, collage_id, last_visit) VALUES (?, ?, ?)",
            params![user_id, collage_id, timestamp(Utc::now())],
        )?;
        debug!(user_id, collage_id, "Subscribed to collage");
        Ok(())
    }

    /// Record a visit. Returns false when the user is not subscribed.
    pub fn mark_visited(&self, user_id: u32, collage_id: u32) -> Result<bool, CollageError> {
        self.mark_visited_at(user_id, collage_id, Utc::now())
    }

    pub(super) fn mark_visited_at(
        &self,
        user_id: u32,
        collage_id: u32,
        at: DateTime<Utc>,
    ) -> Result<bool, CollageError> {
        let conn = self.db.lock()?;
        let updated = conn.execute(
            "UPDATE users_collage_subs SET last_visit = ? WHERE user_id = ? AND collage_id = ?",
            params![timestamp(at), user_id, collage_id],
        )?;
        Ok(updated > 0)
    }

    pub fn subscribed_group_collages(
        &self,
        user_id: u32,
        show_recent: bool,
    ) -> Result<Vec<SubscribedCollage>, CollageError> {
        self.subscribed(Membership::Group, user_id, show_recent)
    }

    pub fn subscribed_artist_collages(
        &self,
        user_id: u32,
        show_recent: bool,
    ) -> Result<Vec<SubscribedCollage>, CollageError> {
        self.subscribed(Membership::Artist, user_id, show_recent)
    }

    /// Subscribed, non-deleted collages that have at least one entry of the
    /// given kind. With `show_recent`, only those with entries newer than
    /// the last visit.
    fn subscribed(
        &self,
        membership: Membership,
        user_id: u32,
        show_recent: bool,
    ) -> Result<Vec<SubscribedCollage>, CollageError> {
        let conn = self.db.lock()?;
        let sql = format!(
            "SELECT c.id, c.name, c.num_torrents, s.last_visit, m.{column}, m.added_on
             FROM collages c
             INNER JOIN users_collage_subs s ON (s.collage_id = c.id)
             INNER JOIN {table} m ON (m.collage_id = c.id)
             WHERE c.deleted = 0 AND s.user_id = ?
             ORDER BY c.id, m.added_on, m.sort",
            column = membership.entity_column(),
            table = membership.table(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut list: Vec<SubscribedCollage> = Vec::new();
        for row in rows {
            let (collage_id, name, num_entries, last_visit_raw, entity_id, added_on) = row?;
            if list.last().map(|c| c.collage_id) != Some(collage_id) {
                list.push(SubscribedCollage {
                    collage_id,
                    name,
                    num_entries,
                    last_visit: parse_timestamp(&last_visit_raw).unwrap_or_else(Utc::now),
                    new_ids: Vec::new(),
                });
            }
            // Lexical comparison matches chronological order for stored timestamps
            if added_on > last_visit_raw {
                if let Some(entry) = list.last_mut() {
                    entry.new_ids.push(entity_id);
                }
            }
        }

        if show_recent {
            list.retain(|c| !c.new_ids.is_empty());
        }
        Ok(list)
    }
}
