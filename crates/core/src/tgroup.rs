//! Torrent group lookup with per-viewer torrent attributes.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;

use crate::db::{Database, StoreError};
use crate::label::{LeechType, TorrentAttributes};

#[derive(Debug, Error)]
pub enum TorrentGroupError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for TorrentGroupError {
    fn from(e: rusqlite::Error) -> Self {
        TorrentGroupError::Store(e.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistRef {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TorrentGroup {
    pub id: u32,
    pub name: String,
    pub year: Option<u32>,
    pub tag_list: String,
    pub image: Option<String>,
    pub artists: Vec<ArtistRef>,
}

/// A torrent as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Torrent {
    pub id: u32,
    pub info_hash: String,
    pub attributes: TorrentAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDetails {
    pub group: TorrentGroup,
    pub torrents: Vec<Torrent>,
}

pub struct TorrentGroupManager {
    db: Database,
}

impl TorrentGroupManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn find_by_id(
        &self,
        group_id: u32,
        viewer_id: u32,
    ) -> Result<Option<GroupDetails>, TorrentGroupError> {
        let conn = self.db.lock()?;
        Ok(Self::details(&conn, group_id, viewer_id)?)
    }

    /// Group owning the torrent with this info hash. Hex case is ignored.
    pub fn find_by_torrent_info_hash(
        &self,
        info_hash: &str,
        viewer_id: u32,
    ) -> Result<Option<GroupDetails>, TorrentGroupError> {
        let conn = self.db.lock()?;
        let group_id: Option<u32> = conn
            .query_row(
                "SELECT group_id FROM torrents WHERE info_hash = ?",
                params![info_hash.trim().to_uppercase()],
                |row| row.get(0),
            )
            .optional()?;
        match group_id {
            Some(id) => Ok(Self::details(&conn, id, viewer_id)?),
            None => Ok(None),
        }
    }

    fn details(
        conn: &Connection,
        group_id: u32,
        viewer_id: u32,
    ) -> rusqlite::Result<Option<GroupDetails>> {
        let group = conn
            .query_row(
                "SELECT id, name, year, tag_list, image FROM torrent_groups WHERE id = ?",
                params![group_id],
                |row| {
                    Ok(TorrentGroup {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        year: row.get(2)?,
                        tag_list: row.get(3)?,
                        image: row.get(4)?,
                        artists: Vec::new(),
                    })
                },
            )
            .optional()?;
        let Some(mut group) = group else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT a.id, a.name FROM artists a
             INNER JOIN torrent_group_artists ga ON (ga.artist_id = a.id)
             WHERE ga.group_id = ?
             ORDER BY a.name",
        )?;
        group.artists = stmt
            .query_map(params![group_id], |row| {
                Ok(ArtistRef {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT t.id, t.info_hash, t.format, t.encoding, t.media,
                    t.has_log, t.has_log_db, t.log_score, t.log_checksum, t.has_cue, t.scene,
                    t.remaster_year, t.remaster_title, t.leech_type,
                    t.bad_tags, t.bad_folders, t.bad_files, t.missing_lineage,
                    t.cassette_approved, t.lossy_master_approved, t.lossy_web_approved,
                    EXISTS (SELECT 1 FROM xbt_snatched x WHERE x.torrent_id = t.id AND x.user_id = ?1),
                    EXISTS (SELECT 1 FROM users_freeleeches f
                            WHERE f.torrent_id = t.id AND f.user_id = ?1 AND f.expired = 0),
                    EXISTS (SELECT 1 FROM reports r WHERE r.torrent_id = t.id AND r.status != 'Resolved')
             FROM torrents t
             WHERE t.group_id = ?2
             ORDER BY t.remaster_year, t.remaster_title, t.media, t.format, t.id",
        )?;
        let torrents = stmt
            .query_map(params![viewer_id, group_id], |row| {
                Ok(Torrent {
                    id: row.get(0)?,
                    info_hash: row.get(1)?,
                    attributes: TorrentAttributes {
                        format: row.get(2)?,
                        encoding: row.get(3)?,
                        media: row.get(4)?,
                        has_log: row.get(5)?,
                        has_log_db: row.get(6)?,
                        log_score: row.get(7)?,
                        log_checksum: row.get(8)?,
                        has_cue: row.get(9)?,
                        scene: row.get(10)?,
                        remaster_year: row.get(11)?,
                        remaster_title: row.get(12)?,
                        leech_type: LeechType::from_stored(row.get(13)?),
                        bad_tags: row.get(14)?,
                        bad_folders: row.get(15)?,
                        bad_files: row.get(16)?,
                        missing_lineage: row.get(17)?,
                        cassette_approved: row.get(18)?,
                        lossy_master_approved: row.get(19)?,
                        lossy_web_approved: row.get(20)?,
                        is_snatched: row.get(21)?,
                        personal_freeleech: row.get(22)?,
                        reported: row.get(23)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(GroupDetails { group, torrents }))
    }
}
