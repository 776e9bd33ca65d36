//! Admin SQL sandbox.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use orpheum_core::{SandboxInput, SandboxOutcome};

use super::error::ApiError;
use super::middleware::CurrentViewer;
use crate::state::AppState;

/// GET parameters: load a query into the editor without running it.
#[derive(Debug, Default, Deserialize)]
pub struct SandboxParams {
    /// Base64-encoded query.
    pub debug: Option<String>,
    pub table: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SandboxBody {
    #[serde(default)]
    pub query: String,
}

impl SandboxParams {
    fn into_input(self) -> Result<SandboxInput, ApiError> {
        match (self.debug, self.table) {
            (None, None) => Ok(SandboxInput::Empty),
            (Some(encoded), None) => Ok(SandboxInput::Debug(encoded)),
            (None, Some(table)) => Ok(SandboxInput::Table(table)),
            (Some(_), Some(_)) => Err(ApiError::bad_request("Supply only one of debug or table")),
        }
    }
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Query(params): Query<SandboxParams>,
) -> Result<Json<SandboxOutcome>, ApiError> {
    let input = params.into_input()?;
    Ok(Json(state.sandbox().run(&viewer, input)?))
}

/// Run a query. Store errors come back in the `error` field with 200.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    CurrentViewer(viewer): CurrentViewer,
    Json(body): Json<SandboxBody>,
) -> Result<Json<SandboxOutcome>, ApiError> {
    Ok(Json(
        state
            .sandbox()
            .run(&viewer, SandboxInput::Query(body.query))?,
    ))
}
