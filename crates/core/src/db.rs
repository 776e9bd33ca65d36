//! SQLite store handle shared by all managers.
//!
//! One connection behind a mutex. Managers receive a cloned [`Database`] at
//! construction instead of reaching for a global handle.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use thiserror::Error;

/// Failure reported by the underlying store.
#[derive(Debug, Clone, Error)]
#[error("Database error: {0}")]
pub struct StoreError(pub String);

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError(e.to_string())
    }
}

/// Cloneable handle to the site database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and make sure all tables exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the connection for the duration of one operation.
    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError("connection mutex poisoned".to_string()))
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                class_level INTEGER NOT NULL DEFAULT 100,
                disable_posting INTEGER NOT NULL DEFAULT 0,
                permissions TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS artists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS torrent_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                year INTEGER,
                tag_list TEXT NOT NULL DEFAULT '',
                image TEXT
            );

            CREATE TABLE IF NOT EXISTS torrent_group_artists (
                group_id INTEGER NOT NULL,
                artist_id INTEGER NOT NULL,
                PRIMARY KEY (group_id, artist_id)
            );

            CREATE TABLE IF NOT EXISTS torrents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                group_id INTEGER NOT NULL,
                info_hash TEXT NOT NULL UNIQUE,
                format TEXT,
                encoding TEXT,
                media TEXT,
                has_log INTEGER NOT NULL DEFAULT 0,
                has_log_db INTEGER NOT NULL DEFAULT 0,
                log_score INTEGER NOT NULL DEFAULT 0,
                log_checksum INTEGER,
                has_cue INTEGER NOT NULL DEFAULT 0,
                scene INTEGER NOT NULL DEFAULT 0,
                remaster_year INTEGER,
                remaster_title TEXT,
                leech_type INTEGER NOT NULL DEFAULT 0,
                bad_tags INTEGER NOT NULL DEFAULT 0,
                bad_folders INTEGER NOT NULL DEFAULT 0,
                bad_files INTEGER NOT NULL DEFAULT 0,
                missing_lineage INTEGER NOT NULL DEFAULT 0,
                cassette_approved INTEGER NOT NULL DEFAULT 0,
                lossy_master_approved INTEGER NOT NULL DEFAULT 0,
                lossy_web_approved INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_torrents_group ON torrents(group_id);

            CREATE TABLE IF NOT EXISTS xbt_snatched (
                user_id INTEGER NOT NULL,
                torrent_id INTEGER NOT NULL,
                PRIMARY KEY (user_id, torrent_id)
            );

            CREATE TABLE IF NOT EXISTS users_freeleeches (
                user_id INTEGER NOT NULL,
                torrent_id INTEGER NOT NULL,
                expired INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, torrent_id)
            );

            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                torrent_id INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'New'
            );

            CREATE TABLE IF NOT EXISTS collages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                tag_list TEXT NOT NULL DEFAULT '',
                user_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                locked INTEGER NOT NULL DEFAULT 0,
                deleted INTEGER NOT NULL DEFAULT 0,
                num_torrents INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL,
                updated TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_collages_name ON collages(name);
            CREATE INDEX IF NOT EXISTS idx_collages_user ON collages(user_id);

            CREATE TABLE IF NOT EXISTS collages_torrents (
                collage_id INTEGER NOT NULL,
                group_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                sort INTEGER NOT NULL DEFAULT 0,
                added_on TEXT NOT NULL,
                PRIMARY KEY (collage_id, group_id)
            );

            CREATE INDEX IF NOT EXISTS idx_collages_torrents_user ON collages_torrents(user_id);

            CREATE TABLE IF NOT EXISTS collages_artists (
                collage_id INTEGER NOT NULL,
                artist_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                sort INTEGER NOT NULL DEFAULT 0,
                added_on TEXT NOT NULL,
                PRIMARY KEY (collage_id, artist_id)
            );

            CREATE INDEX IF NOT EXISTS idx_collages_artists_user ON collages_artists(user_id);

            CREATE TABLE IF NOT EXISTS users_collage_subs (
                user_id INTEGER NOT NULL,
                collage_id INTEGER NOT NULL,
                last_visit TEXT NOT NULL,
                PRIMARY KEY (user_id, collage_id)
            );

            CREATE TABLE IF NOT EXISTS forums (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                min_class_read INTEGER NOT NULL DEFAULT 0,
                min_class_write INTEGER NOT NULL DEFAULT 0,
                min_class_create INTEGER NOT NULL DEFAULT 0,
                num_topics INTEGER NOT NULL DEFAULT 0,
                num_posts INTEGER NOT NULL DEFAULT 0,
                last_topic_id INTEGER,
                last_post_id INTEGER,
                last_post_author_id INTEGER,
                last_post_time TEXT
            );

            CREATE TABLE IF NOT EXISTS forums_topics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                forum_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                author_id INTEGER NOT NULL,
                is_locked INTEGER NOT NULL DEFAULT 0,
                is_sticky INTEGER NOT NULL DEFAULT 0,
                num_posts INTEGER NOT NULL DEFAULT 0,
                last_post_id INTEGER,
                last_post_author_id INTEGER,
                last_post_time TEXT,
                created_time TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_forums_topics_forum ON forums_topics(forum_id);

            CREATE TABLE IF NOT EXISTS forums_posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                body TEXT NOT NULL,
                added_time TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS forums_polls (
                topic_id INTEGER PRIMARY KEY,
                question TEXT NOT NULL,
                answers TEXT NOT NULL,
                closed INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS forums_polls_votes (
                topic_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                vote INTEGER NOT NULL,
                PRIMARY KEY (topic_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS users_subscriptions (
                user_id INTEGER NOT NULL,
                topic_id INTEGER NOT NULL,
                PRIMARY KEY (user_id, topic_id)
            );

            CREATE TABLE IF NOT EXISTS site_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message TEXT NOT NULL,
                time TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

/// Timestamp format stored in TEXT columns. Fixed precision keeps
/// lexical order equal to chronological order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
