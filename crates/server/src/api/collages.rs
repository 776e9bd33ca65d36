//! Collage API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use orpheum_core::{
    AutocompleteEntry, Collage, CollageName, CollageRef, NewCollage, SubscribedCollage,
};

use super::error::ApiError;
use super::middleware::CurrentViewer;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NameParams {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
    pub collage: Option<CollageRef>,
}

#[derive(Debug, Serialize)]
pub struct AutocompleteResponse {
    pub query: String,
    pub suggestions: Vec<AutocompleteEntry>,
}

#[derive(Debug, Serialize)]
pub struct PersonalNameResponse {
    pub name: String,
}

/// Recover a deleted collage by id or by exact name.
#[derive(Debug, Deserialize)]
pub struct RecoverBody {
    pub id: Option<u32>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddGroupBody {
    pub group_id: u32,
}

#[derive(Debug, Deserialize)]
pub struct AddArtistBody {
    pub artist_id: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionKind {
    Group,
    Artist,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionParams {
    pub kind: SubscriptionKind,
    #[serde(default)]
    pub recent: bool,
}

#[derive(Debug, Serialize)]
pub struct VisitResponse {
    pub subscribed: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a collage
pub async fn create_collage(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Json(body): Json<NewCollage>,
) -> Result<(StatusCode, Json<Collage>), ApiError> {
    let collage = state.collages().create(&viewer, body)?;
    Ok((StatusCode::CREATED, Json(collage)))
}

/// Duplicate-name check
pub async fn exists(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameParams>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let collage = state.collages().exists(&params.name)?;
    Ok(Json(ExistsResponse {
        exists: collage.is_some(),
        collage,
    }))
}

pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameParams>,
) -> Result<Json<Collage>, ApiError> {
    state
        .collages()
        .find_by_name(&params.name)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Collage not found: {}", params.name)))
}

pub async fn autocomplete(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameParams>,
) -> Result<Json<AutocompleteResponse>, ApiError> {
    let suggestions = state.collages().autocomplete(&params.name)?;
    Ok(Json(AutocompleteResponse {
        query: params.name,
        suggestions,
    }))
}

/// First unused personal collage name for the viewer
pub async fn personal_name(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
) -> Result<Json<PersonalNameResponse>, ApiError> {
    let name = state.collages().personal_collage_name(&viewer.username)?;
    Ok(Json(PersonalNameResponse { name }))
}

/// Recover a deleted collage. Needs `site_collages_recover`.
pub async fn recover(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Json(body): Json<RecoverBody>,
) -> Result<Json<Collage>, ApiError> {
    let recovered = match (body.id, body.name.as_deref()) {
        (Some(id), None) => state.collages().recover_by_id(&viewer, id)?,
        (None, Some(name)) => state.collages().recover_by_name(&viewer, name)?,
        _ => return Err(ApiError::bad_request("Supply exactly one of id or name")),
    };
    recovered
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Collage not found"))
}

pub async fn get_collage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<Collage>, ApiError> {
    state
        .collages()
        .find_by_id(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Collage not found: {}", id)))
}

/// Soft delete a collage (owner or `site_collages_delete`)
pub async fn delete_collage(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<u32>,
) -> Result<StatusCode, ApiError> {
    state.collages().soft_delete(&viewer, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_group(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<u32>,
    Json(body): Json<AddGroupBody>,
) -> Result<StatusCode, ApiError> {
    state.collages().add_group(id, body.group_id, viewer.id)?;
    Ok(StatusCode::CREATED)
}

pub async fn add_artist(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<u32>,
    Json(body): Json<AddArtistBody>,
) -> Result<StatusCode, ApiError> {
    state.collages().add_artist(id, body.artist_id, viewer.id)?;
    Ok(StatusCode::CREATED)
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<u32>,
) -> Result<StatusCode, ApiError> {
    state.collages().subscribe(viewer.id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a visit; a no-op for collages the viewer is not subscribed to
pub async fn visit(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<u32>,
) -> Result<Json<VisitResponse>, ApiError> {
    let subscribed = state.collages().mark_visited(viewer.id, id)?;
    Ok(Json(VisitResponse { subscribed }))
}

pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Query(params): Query<SubscriptionParams>,
) -> Result<Json<Vec<SubscribedCollage>>, ApiError> {
    let collages = match params.kind {
        SubscriptionKind::Group => state
            .collages()
            .subscribed_group_collages(viewer.id, params.recent)?,
        SubscriptionKind::Artist => state
            .collages()
            .subscribed_artist_collages(viewer.id, params.recent)?,
    };
    Ok(Json(collages))
}

pub async fn suggest_group(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Path(group_id): Path<u32>,
) -> Result<Json<Vec<CollageName>>, ApiError> {
    Ok(Json(
        state.collages().suggest_group_collages(viewer.id, group_id)?,
    ))
}

pub async fn suggest_artist(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Path(artist_id): Path<u32>,
) -> Result<Json<Vec<CollageName>>, ApiError> {
    Ok(Json(
        state.collages().suggest_artist_collages(viewer.id, artist_id)?,
    ))
}

/// Drop both of the viewer's cached suggestion lists
pub async fn flush_suggestions(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
) -> StatusCode {
    state.collages().flush_group_suggestions(viewer.id);
    state.collages().flush_artist_suggestions(viewer.id);
    StatusCode::NO_CONTENT
}
