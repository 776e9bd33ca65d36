//! Collages: curated lists of release groups or artists.

mod manager;
mod subscriptions;
mod suggestions;
mod types;

pub use manager::CollageManager;
pub use types::{
    AutocompleteEntry, Collage, CollageCategory, CollageName, CollageRef, NewCollage,
    SubscribedCollage,
};

use thiserror::Error;

use crate::db::StoreError;

/// Errors from collage operations.
#[derive(Debug, Error)]
pub enum CollageError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("A collage named \"{name}\" already exists")]
    Duplicate { name: String, existing: CollageRef },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for CollageError {
    fn from(e: rusqlite::Error) -> Self {
        CollageError::Store(e.into())
    }
}
