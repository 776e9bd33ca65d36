//! Torrent status labels, e.g. `FLAC / Lossless / Log (100%) / Cue`.
//!
//! Plain fragments (format, encoding, log, media, edition) are emitted as
//! text. Status badges are emitted as fixed `<strong>` markup.

use serde::{Deserialize, Serialize};

/// Stored leech state of a torrent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeechType {
    #[default]
    Normal,
    Free,
    Neutral,
}

impl LeechType {
    /// Unknown values read as normal leech.
    pub fn from_stored(value: i64) -> Self {
        match value {
            1 => LeechType::Free,
            2 => LeechType::Neutral,
            _ => LeechType::Normal,
        }
    }

    pub fn stored(self) -> i64 {
        match self {
            LeechType::Normal => 0,
            LeechType::Free => 1,
            LeechType::Neutral => 2,
        }
    }
}

/// Everything the label looks at. Absent values are `None` or `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TorrentAttributes {
    pub format: Option<String>,
    pub encoding: Option<String>,
    pub media: Option<String>,
    pub has_log: bool,
    pub has_log_db: bool,
    pub log_score: i32,
    /// `None` when the log was never checked.
    pub log_checksum: Option<bool>,
    pub has_cue: bool,
    pub scene: bool,
    pub remaster_year: Option<u32>,
    pub remaster_title: Option<String>,
    pub leech_type: LeechType,
    pub is_snatched: bool,
    pub personal_freeleech: bool,
    pub reported: bool,
    pub bad_tags: bool,
    pub bad_folders: bool,
    pub bad_files: bool,
    pub missing_lineage: bool,
    pub cassette_approved: bool,
    pub lossy_master_approved: bool,
    pub lossy_web_approved: bool,
}

/// Label renderer. Defaults: no media, no edition, no flags, `" / "` separator.
#[derive(Debug, Clone)]
pub struct TorrentLabel {
    show_media: bool,
    show_edition: bool,
    show_flags: bool,
    group_name: Option<String>,
    separator: String,
}

impl Default for TorrentLabel {
    fn default() -> Self {
        Self {
            show_media: false,
            show_edition: false,
            show_flags: false,
            group_name: None,
            separator: " / ".to_string(),
        }
    }
}

impl TorrentLabel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_media(mut self, flag: bool) -> Self {
        self.show_media = flag;
        self
    }

    pub fn show_edition(mut self, flag: bool) -> Self {
        self.show_edition = flag;
        self
    }

    /// Cautionary flags (checksum, bad tags/folders/file names).
    pub fn show_flags(mut self, flag: bool) -> Self {
        self.show_flags = flag;
        self
    }

    /// Shown only when nothing else describes the torrent.
    pub fn group_name(mut self, name: impl Into<String>) -> Self {
        self.group_name = Some(name.into());
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn format(&self, info: &TorrentAttributes) -> String {
        self.labels(info).join(&self.separator)
    }

    pub fn labels(&self, info: &TorrentAttributes) -> Vec<String> {
        let mut label = Vec::new();

        if let Some(format) = present(&info.format) {
            label.push(format.to_string());
        }
        if let Some(encoding) = present(&info.encoding) {
            label.push(encoding.to_string());
        }
        if present(&info.media) == Some("CD") {
            if info.has_log {
                label.push(if info.has_log_db {
                    format!("Log ({}%)", info.log_score)
                } else {
                    "Log".to_string()
                });
            }
            if info.has_cue {
                label.push("Cue".to_string());
            }
        }
        if self.show_media {
            if let Some(media) = present(&info.media) {
                label.push(media.to_string());
            }
        }
        if info.scene {
            label.push("Scene".to_string());
        }
        if label.is_empty() {
            if let Some(name) = present(&self.group_name) {
                label.push(name.to_string());
            }
        }
        if self.show_edition {
            let mut edition = Vec::new();
            if let Some(year) = info.remaster_year.filter(|y| *y > 0) {
                edition.push(year.to_string());
            }
            if let Some(title) = present(&info.remaster_title) {
                edition.push(title.to_string());
            }
            if !edition.is_empty() {
                label.push(edition.join(" "));
            }
        }

        if info.is_snatched {
            label.push(element("tl_snatched", "Snatched!"));
        }
        match info.leech_type {
            LeechType::Free => label.push(element("tl_free", "Freeleech!")),
            LeechType::Neutral => label.push(element("tl_free tl_neutral", "Neutral Leech!")),
            LeechType::Normal => {}
        }
        if info.personal_freeleech {
            label.push(element("tl_free tl_personal", "Personal Freeleech!"));
        }
        if info.reported {
            label.push(element("tl_reported", "Reported"));
        }

        if self.show_flags {
            if info.has_log && info.has_log_db && info.log_checksum != Some(true) {
                label.push(element("tl_notice", "Bad/Missing Checksum"));
            }
            if info.bad_tags {
                label.push(element("tl_reported tl_bad_tags", "Bad Tags"));
            }
            if info.bad_folders {
                label.push(element("tl_reported tl_bad_folders", "Bad Folders"));
            }
            if info.bad_files {
                label.push(element("tl_reported tl_bad_filenames", "Bad File Names"));
            }
        }

        if info.missing_lineage {
            label.push(element("tl_reported tl_missing_lineage", "Missing Lineage"));
        }
        if info.cassette_approved {
            label.push(element("tl_approved tl_cassette", "Cassette Approved"));
        }
        if info.lossy_master_approved {
            label.push(element("tl_approved tl_lossy_master", "Lossy Master Approved"));
        }
        if info.lossy_web_approved {
            label.push(element("tl_approved tl_lossy_web", "Lossy WEB Approved"));
        }

        label
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn element(class: &str, text: &str) -> String {
    format!(
        r#"<strong class="torrent_label tooltip {}" title="{}" style="white-space: nowrap;">{}</strong>"#,
        class, text, text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flac_cd() -> TorrentAttributes {
        TorrentAttributes {
            format: Some("FLAC".to_string()),
            encoding: Some("Lossless".to_string()),
            media: Some("CD".to_string()),
            has_log: true,
            has_log_db: true,
            log_score: 95,
            log_checksum: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_flac_cd_with_scored_log() {
        assert_eq!(TorrentLabel::new().format(&flac_cd()), "FLAC / Lossless / Log (95%)");
    }

    #[test]
    fn test_scored_log_without_checksum_info() {
        let info = TorrentAttributes {
            format: Some("FLAC".to_string()),
            encoding: Some("Lossless".to_string()),
            media: Some("CD".to_string()),
            has_log: true,
            has_log_db: true,
            log_score: 95,
            ..Default::default()
        };
        assert_eq!(TorrentLabel::new().format(&info), "FLAC / Lossless / Log (95%)");
        assert!(TorrentLabel::new()
            .show_flags(true)
            .format(&info)
            .ends_with(">Bad/Missing Checksum</strong>"));
    }

    #[test]
    fn test_log_without_db_and_cue() {
        let info = TorrentAttributes {
            has_log_db: false,
            has_cue: true,
            ..flac_cd()
        };
        assert_eq!(TorrentLabel::new().format(&info), "FLAC / Lossless / Log / Cue");
    }

    #[test]
    fn test_log_ignored_for_non_cd_media() {
        let info = TorrentAttributes {
            media: Some("WEB".to_string()),
            has_cue: true,
            ..flac_cd()
        };
        assert_eq!(
            TorrentLabel::new().show_media(true).format(&info),
            "FLAC / Lossless / WEB"
        );
    }

    #[test]
    fn test_media_scene_and_edition() {
        let info = TorrentAttributes {
            scene: true,
            remaster_year: Some(2012),
            remaster_title: Some("Deluxe Edition".to_string()),
            ..flac_cd()
        };
        let labels = TorrentLabel::new()
            .show_media(true)
            .show_edition(true)
            .labels(&info);
        assert_eq!(
            labels,
            vec!["FLAC", "Lossless", "Log (95%)", "CD", "Scene", "2012 Deluxe Edition"]
        );
    }

    #[test]
    fn test_edition_hidden_by_default_and_partial() {
        let info = TorrentAttributes {
            remaster_title: Some("Remaster".to_string()),
            remaster_year: Some(0),
            ..flac_cd()
        };
        assert!(!TorrentLabel::new().format(&info).contains("Remaster"));
        let labels = TorrentLabel::new().show_edition(true).labels(&info);
        assert_eq!(labels.last().unwrap(), "Remaster");
    }

    #[test]
    fn test_group_name_only_when_nothing_else() {
        let empty = TorrentAttributes::default();
        let label = TorrentLabel::new().group_name("Loveless");
        assert_eq!(label.format(&empty), "Loveless");
        assert_eq!(label.format(&flac_cd()), "FLAC / Lossless / Log (95%)");
        assert_eq!(TorrentLabel::new().format(&empty), "");
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let info = TorrentAttributes {
            format: Some(String::new()),
            encoding: Some("320".to_string()),
            ..Default::default()
        };
        assert_eq!(TorrentLabel::new().format(&info), "320");
    }

    #[test]
    fn test_badge_markup() {
        let info = TorrentAttributes {
            is_snatched: true,
            ..Default::default()
        };
        assert_eq!(
            TorrentLabel::new().format(&info),
            r#"<strong class="torrent_label tooltip tl_snatched" title="Snatched!" style="white-space: nowrap;">Snatched!</strong>"#
        );
    }

    #[test]
    fn test_leech_badges_are_exclusive() {
        let free = TorrentAttributes {
            leech_type: LeechType::Free,
            ..Default::default()
        };
        let labels = TorrentLabel::new().labels(&free);
        assert_eq!(labels.len(), 1);
        assert!(labels[0].contains("Freeleech!"));

        let neutral = TorrentAttributes {
            leech_type: LeechType::Neutral,
            ..Default::default()
        };
        let labels = TorrentLabel::new().labels(&neutral);
        assert_eq!(labels.len(), 1);
        assert!(labels[0].contains("tl_free tl_neutral"));
        assert!(labels[0].contains("Neutral Leech!"));
    }

    #[test]
    fn test_personal_freeleech_appears_once() {
        let info = TorrentAttributes {
            leech_type: LeechType::Free,
            personal_freeleech: true,
            ..Default::default()
        };
        let labels = TorrentLabel::new().labels(&info);
        assert_eq!(labels.len(), 2);
        assert_eq!(
            labels.iter().filter(|l| l.contains("Personal Freeleech!")).count(),
            1
        );
    }

    #[test]
    fn test_badge_order() {
        let info = TorrentAttributes {
            is_snatched: true,
            leech_type: LeechType::Neutral,
            personal_freeleech: true,
            reported: true,
            bad_tags: true,
            bad_folders: true,
            bad_files: true,
            missing_lineage: true,
            cassette_approved: true,
            lossy_master_approved: true,
            lossy_web_approved: true,
            ..flac_cd()
        };
        let labels = TorrentLabel::new().show_flags(true).labels(&info);
        let titles: Vec<&str> = labels
            .iter()
            .skip(3)
            .map(|l| l.split("title=\"").nth(1).unwrap().split('"').next().unwrap())
            .collect();
        assert_eq!(
            titles,
            vec![
                "Snatched!",
                "Neutral Leech!",
                "Personal Freeleech!",
                "Reported",
                "Bad Tags",
                "Bad Folders",
                "Bad File Names",
                "Missing Lineage",
                "Cassette Approved",
                "Lossy Master Approved",
                "Lossy WEB Approved",
            ]
        );
    }

    #[test]
    fn test_checksum_flag() {
        let missing = TorrentAttributes {
            log_checksum: None,
            ..flac_cd()
        };
        let bad = TorrentAttributes {
            log_checksum: Some(false),
            ..flac_cd()
        };
        let flagged = TorrentLabel::new().show_flags(true);
        assert!(flagged.format(&missing).contains("Bad/Missing Checksum"));
        assert!(flagged.format(&bad).contains("Bad/Missing Checksum"));
        assert!(!flagged.format(&flac_cd()).contains("Checksum"));

        let no_db = TorrentAttributes {
            has_log_db: false,
            ..bad
        };
        assert!(!flagged.format(&no_db).contains("Checksum"));
    }

    #[test]
    fn test_flags_hidden_by_default() {
        let info = TorrentAttributes {
            log_checksum: Some(false),
            bad_tags: true,
            bad_folders: true,
            bad_files: true,
            missing_lineage: true,
            lossy_web_approved: true,
            ..flac_cd()
        };
        let labels = TorrentLabel::new().labels(&info);
        assert_eq!(labels.len(), 5);
        assert!(labels[3].contains("Missing Lineage"));
        assert!(labels[4].contains("Lossy WEB Approved"));
    }

    #[test]
    fn test_custom_separator() {
        assert_eq!(
            TorrentLabel::new().separator(", ").format(&flac_cd()),
            "FLAC, Lossless, Log (95%)"
        );
    }

    #[test]
    fn test_leech_type_storage() {
        assert_eq!(LeechType::from_stored(1), LeechType::Free);
        assert_eq!(LeechType::from_stored(2), LeechType::Neutral);
        assert_eq!(LeechType::from_stored(7), LeechType::Normal);
        assert_eq!(LeechType::Neutral.stored(), 2);
    }
}
