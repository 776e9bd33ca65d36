//! Forums, threads and polls.

mod manager;
mod thread;
mod types;

pub use manager::ForumManager;
pub use thread::{build_poll_answers, ThreadCreator, MAX_POLL_ANSWERS, MAX_TITLE_LENGTH};
pub use types::{CreatedThread, Forum, NewThread, Poll, Thread};

use thiserror::Error;

use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum ForumError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for ForumError {
    fn from(e: rusqlite::Error) -> Self {
        ForumError::Store(e.into())
    }
}
