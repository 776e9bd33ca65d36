use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use orpheum_core::{SanitizedConfig, SiteLogEntry};

use super::error::ApiError;
use crate::metrics::encode_metrics;
use crate::state::AppState;

const DEFAULT_LOG_LIMIT: u32 = 50;
const MAX_LOG_LIMIT: u32 = 500;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus text exposition.
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

#[derive(Debug, Deserialize)]
pub struct SiteLogParams {
    pub limit: Option<u32>,
}

/// Most recent site log lines, newest first.
pub async fn site_log(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SiteLogParams>,
) -> Result<Json<Vec<SiteLogEntry>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
    Ok(Json(state.site_log().recent(limit)?))
}
