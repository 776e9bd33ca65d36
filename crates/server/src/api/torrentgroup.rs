//! Torrent group lookup.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use orpheum_core::{TorrentAttributes, TorrentGroup, TorrentLabel};

use super::error::ApiError;
use super::middleware::CurrentViewer;
use crate::state::AppState;

const BAD_PARAMETERS: &str = "bad parameters";

#[derive(Debug, Deserialize)]
pub struct GroupParams {
    pub id: Option<u32>,
    pub hash: Option<String>,
    #[serde(default)]
    pub show_media: bool,
    #[serde(default)]
    pub show_edition: bool,
}

#[derive(Debug, Serialize)]
pub struct TorrentResponse {
    pub id: u32,
    pub info_hash: String,
    pub label: String,
    pub attributes: TorrentAttributes,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub group: TorrentGroup,
    pub torrents: Vec<TorrentResponse>,
}

/// Look a group up by id or by the info hash of one of its torrents.
///
/// Exactly one of `id` and `hash` must be given. Both a missing parameter
/// and an unknown group answer 400 "bad parameters".
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Query(params): Query<GroupParams>,
) -> Result<Json<GroupResponse>, ApiError> {
    let hash = params.hash.as_deref().map(str::trim).filter(|h| !h.is_empty());
    let details = match (params.id, hash) {
        (Some(id), None) => state.groups().find_by_id(id, viewer.id)?,
        (None, Some(hash)) => state.groups().find_by_torrent_info_hash(hash, viewer.id)?,
        _ => return Err(ApiError::bad_request(BAD_PARAMETERS)),
    };
    let details = details.ok_or_else(|| ApiError::bad_request(BAD_PARAMETERS))?;

    let label = TorrentLabel::new()
        .show_media(params.show_media)
        .show_edition(params.show_edition)
        .group_name(details.group.name.clone());
    let torrents = details
        .torrents
        .into_iter()
        .map(|t| TorrentResponse {
            id: t.id,
            info_hash: t.info_hash,
            label: label.format(&t.attributes),
            attributes: t.attributes,
        })
        .collect();

    Ok(Json(GroupResponse {
        group: details.group,
        torrents,
    }))
}
