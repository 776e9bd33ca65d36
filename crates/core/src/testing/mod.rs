//! Testing utilities shared by unit and server integration tests.
//!
//! Seed helpers write rows directly with explicit timestamps, so ordering
//! assertions don't depend on the wall clock.
//!
//! # Example
//!
//! ```rust,ignore
//! use orpheum_core::testing::fixtures::{self, at, CollageSeed};
//!
//! let user = fixtures::seed_user(&db, "alice", 100, &[]);
//! let collage = fixtures::seed_collage(
//!     &db,
//!     CollageSeed::new(user, CollageCategory::Personal, "alice's personal collage").updated_at(at(60)),
//! );
//! ```

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rusqlite::params;

    use crate::collage::CollageCategory;
    use crate::db::{timestamp, Database};
    use crate::label::TorrentAttributes;
    use crate::query::Membership;

    /// A fixed instant `secs` seconds after 2024-01-01T00:00:00Z.
    pub fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    pub fn seed_user(db: &Database, username: &str, class_level: u32, permissions: &[&str]) -> u32 {
        let conn = db.lock().unwrap();
        conn.execute(
            "INSERT INTO users (username, class_level, permissions) VALUES (?, ?, ?)",
            params![username, class_level, permissions.join(",")],
        )
        .unwrap();
        conn.last_insert_rowid() as u32
    }

    /// Collage row to insert. Defaults: unlocked, live, empty, updated at `at(0)`.
    #[derive(Debug, Clone)]
    pub struct CollageSeed {
        pub owner: u32,
        pub category: CollageCategory,
        pub name: String,
        pub locked: bool,
        pub deleted: bool,
        pub num_torrents: u32,
        pub updated: DateTime<Utc>,
    }

    impl CollageSeed {
        pub fn new(owner: u32, category: CollageCategory, name: &str) -> Self {
            Self {
                owner,
                category,
                name: name.to_string(),
                locked: false,
                deleted: false,
                num_torrents: 0,
                updated: at(0),
            }
        }

        pub fn locked(mut self) -> Self {
            self.locked = true;
            self
        }

        pub fn deleted(mut self) -> Self {
            self.deleted = true;
            self
        }

        pub fn num_torrents(mut self, n: u32) -> Self {
            self.num_torrents = n;
            self
        }

        pub fn updated_at(mut self, updated: DateTime<Utc>) -> Self {
            self.updated = updated;
            self
        }
    }

    pub fn seed_collage(db: &Database, seed: CollageSeed) -> u32 {
        let conn = db.lock().unwrap();
        conn.execute(
            "INSERT INTO collages (name, user_id, category_id, locked, deleted, num_torrents, created, updated)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                seed.name,
                seed.owner,
                seed.category.id(),
                seed.locked,
                seed.deleted,
                seed.num_torrents,
                timestamp(at(0)),
                timestamp(seed.updated)
            ],
        )
        .unwrap();
        conn.last_insert_rowid() as u32
    }

    pub fn seed_group(db: &Database, name: &str) -> u32 {
        let conn = db.lock().unwrap();
        conn.execute(
            "INSERT INTO torrent_groups (name, year) VALUES (?, 1990)",
            params![name],
        )
        .unwrap();
        conn.last_insert_rowid() as u32
    }

    pub fn seed_artist(db: &Database, name: &str) -> u32 {
        let conn = db.lock().unwrap();
        conn.execute("INSERT INTO artists (name) VALUES (?)", params![name])
            .unwrap();
        conn.last_insert_rowid() as u32
    }

    pub fn link_artist(db: &Database, group_id: u32, artist_id: u32) {
        db.lock()
            .unwrap()
            .execute(
                "INSERT INTO torrent_group_artists (group_id, artist_id) VALUES (?, ?)",
                params![group_id, artist_id],
            )
            .unwrap();
    }

    /// Membership row added by `user_id` at `added_on`. Counts are not touched.
    pub fn seed_member(
        db: &Database,
        membership: Membership,
        collage_id: u32,
        entity_id: u32,
        user_id: u32,
        added_on: DateTime<Utc>,
    ) {
        db.lock()
            .unwrap()
            .execute(
                &format!(
                    "INSERT INTO {} (collage_id, {}, user_id, sort, added_on) VALUES (?, ?, ?, 0, ?)",
                    membership.table(),
                    membership.entity_column()
                ),
                params![collage_id, entity_id, user_id, timestamp(added_on)],
            )
            .unwrap();
    }

    /// Torrent row from its stored attributes. Per-viewer facts are ignored.
    pub fn seed_torrent(db: &Database, group_id: u32, info_hash: &str, attrs: &TorrentAttributes) -> u32 {
        let conn = db.lock().unwrap();
        conn.execute(
            "INSERT INTO torrents (group_id, info_hash, format, encoding, media, has_log, has_log_db,
                log_score, log_checksum, has_cue, scene, remaster_year, remaster_title, leech_type,
                bad_tags, bad_folders, bad_files, missing_lineage, cassette_approved,
                lossy_master_approved, lossy_web_approved)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                group_id,
                info_hash.to_uppercase(),
                attrs.format,
                attrs.encoding,
                attrs.media,
                attrs.has_log,
                attrs.has_log_db,
                attrs.log_score,
                attrs.log_checksum,
                attrs.has_cue,
                attrs.scene,
                attrs.remaster_year,
                attrs.remaster_title,
                attrs.leech_type.stored(),
                attrs.bad_tags,
                attrs.bad_folders,
                attrs.bad_files,
                attrs.missing_lineage,
                attrs.cassette_approved,
                attrs.lossy_master_approved,
                attrs.lossy_web_approved
            ],
        )
        .unwrap();
        conn.last_insert_rowid() as u32
    }

    pub fn seed_forum(db: &Database, name: &str, min_read: u32, min_write: u32, min_create: u32) -> u32 {
        let conn = db.lock().unwrap();
        conn.execute(
            "INSERT INTO forums (name, min_class_read, min_class_write, min_class_create) VALUES (?, ?, ?, ?)",
            params![name, min_read, min_write, min_create],
        )
        .unwrap();
        conn.last_insert_rowid() as u32
    }
}
