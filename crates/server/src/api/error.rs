//! Mapping from domain errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use orpheum_core::{CollageError, ForumError, SandboxError, StoreError, TorrentGroupError};

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Existing collage on a duplicate name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    /// Forum to return to after a rejected thread.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forum_id: Option<u32>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                id: None,
                deleted: None,
                forum_id: None,
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    pub fn with_forum(mut self, forum_id: u32) -> Self {
        self.body.forum_id = Some(forum_id);
        self
    }

    fn internal(e: &StoreError) -> Self {
        error!("Store failure: {}", e);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::internal(&e)
    }
}

impl From<CollageError> for ApiError {
    fn from(e: CollageError) -> Self {
        let message = e.to_string();
        match e {
            CollageError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            CollageError::Forbidden(msg) => Self::new(StatusCode::FORBIDDEN, msg),
            CollageError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            CollageError::Duplicate { existing, .. } => {
                let mut err = Self::new(StatusCode::CONFLICT, message);
                err.body.id = Some(existing.id);
                err.body.deleted = Some(existing.deleted);
                err
            }
            CollageError::Store(e) => Self::internal(&e),
        }
    }
}

impl From<ForumError> for ApiError {
    fn from(e: ForumError) -> Self {
        match e {
            ForumError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            ForumError::Forbidden(msg) => Self::new(StatusCode::FORBIDDEN, msg),
            ForumError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            ForumError::Store(e) => Self::internal(&e),
        }
    }
}

impl From<SandboxError> for ApiError {
    fn from(e: SandboxError) -> Self {
        match e {
            SandboxError::Forbidden => Self::new(StatusCode::FORBIDDEN, e.to_string()),
            SandboxError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            SandboxError::Store(e) => Self::internal(&e),
        }
    }
}

impl From<TorrentGroupError> for ApiError {
    fn from(e: TorrentGroupError) -> Self {
        match e {
            TorrentGroupError::Store(e) => Self::internal(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orpheum_core::CollageRef;

    #[test]
    fn test_duplicate_collage_maps_to_conflict() {
        let err = ApiError::from(CollageError::Duplicate {
            name: "Shoegaze".to_string(),
            existing: CollageRef { id: 4, deleted: true },
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.body.id, Some(4));
        assert_eq!(err.body.deleted, Some(true));
    }

    #[test]
    fn test_forum_errors_map_by_kind() {
        let cases = [
            (ForumError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ForumError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ForumError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                ForumError::Store(StoreError("disk".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (e, status) in cases {
            assert_eq!(ApiError::from(e).status, status);
        }
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let json = serde_json::to_value(ApiError::bad_request("nope").body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "nope" }));
    }
}
