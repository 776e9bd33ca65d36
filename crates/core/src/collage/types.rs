use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collage categories. Discriminants match the stored `category_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollageCategory {
    Personal,
    Theme,
    GenreIntroduction,
    Discography,
    Label,
    StaffPicks,
    Charts,
    Artists,
}

impl CollageCategory {
    pub fn id(self) -> u32 {
        match self {
            CollageCategory::Personal => 0,
            CollageCategory::Theme => 1,
            CollageCategory::GenreIntroduction => 2,
            CollageCategory::Discography => 3,
            CollageCategory::Label => 4,
            CollageCategory::StaffPicks => 5,
            CollageCategory::Charts => 6,
            CollageCategory::Artists => 7,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Some(match id {
            0 => CollageCategory::Personal,
            1 => CollageCategory::Theme,
            2 => CollageCategory::GenreIntroduction,
            3 => CollageCategory::Discography,
            4 => CollageCategory::Label,
            5 => CollageCategory::StaffPicks,
            6 => CollageCategory::Charts,
            7 => CollageCategory::Artists,
            _ => return None,
        })
    }

    /// Artist collages hold artists; every other category holds release groups.
    pub fn holds_artists(self) -> bool {
        self == CollageCategory::Artists
    }
}

/// A stored collage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collage {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub tag_list: String,
    pub user_id: u32,
    pub category: CollageCategory,
    pub locked: bool,
    pub deleted: bool,
    pub num_torrents: u32,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Result of a duplicate-name check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollageRef {
    pub id: u32,
    pub deleted: bool,
}

/// Input for creating a collage.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCollage {
    pub category: CollageCategory,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tag_list: String,
}

/// One suggested collage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollageName {
    pub id: u32,
    pub name: String,
}

/// One autocomplete match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteEntry {
    pub id: u32,
    pub label: String,
}

/// A subscribed collage and what was added to it since the last visit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscribedCollage {
    pub collage_id: u32,
    pub name: String,
    pub num_entries: u32,
    pub last_visit: DateTime<Utc>,
    /// Group or artist ids added after `last_visit`, oldest first.
    pub new_ids: Vec<u32>,
}
