//! Forum API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use orpheum_core::{CreatedThread, ForumError, NewThread, Poll, Thread};

use super::error::ApiError;
use super::middleware::CurrentViewer;
use crate::state::AppState;

/// Create a thread, with a poll when a question and answers are supplied.
///
/// A rejected title, body or poll answers the 400 with the forum id so
/// the caller can return to that forum's form.
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Json(body): Json<NewThread>,
) -> Result<(StatusCode, Json<CreatedThread>), ApiError> {
    let forum_id = body.forum_id;
    match state.threads().create(&viewer, body) {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(e @ ForumError::Validation(_)) => Err(ApiError::from(e).with_forum(forum_id)),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Serialize)]
pub struct ThreadView {
    pub thread: Thread,
    pub poll: Option<Poll>,
    pub subscribed: bool,
}

/// Read back a thread with its poll, if the viewer may read its forum.
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<u32>,
) -> Result<Json<ThreadView>, ApiError> {
    let forums = state.forums();
    let thread = forums
        .find_thread(id)?
        .ok_or_else(|| ForumError::NotFound(format!("Thread {} not found", id)))?;
    let readable = forums
        .find_by_id(thread.forum_id)?
        .is_some_and(|forum| viewer.read_access(&forum));
    if !readable {
        return Err(ForumError::Forbidden("You are not allowed to read this forum.".to_string()).into());
    }

    Ok(Json(ThreadView {
        poll: forums.poll(id)?,
        subscribed: forums.is_subscribed(viewer.id, id)?,
        thread,
    }))
}
