use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Forum {
    pub id: u32,
    pub name: String,
    pub min_class_read: u32,
    pub min_class_write: u32,
    pub min_class_create: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thread {
    pub id: u32,
    pub forum_id: u32,
    pub title: String,
    pub author_id: u32,
    pub num_posts: u32,
    pub last_post_id: Option<u32>,
    pub created: DateTime<Utc>,
}

/// A poll attached to a thread. Answer keys are stable 1-based positions
/// from the submitted form, so gaps are possible.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poll {
    pub thread_id: u32,
    pub question: String,
    pub answers: BTreeMap<u32, String>,
    pub votes: BTreeMap<u32, u32>,
    pub closed: bool,
}

/// Submitted "new thread" form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewThread {
    pub forum_id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub subscribe: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedThread {
    pub thread_id: u32,
    pub forum_id: u32,
    pub post_id: u32,
    pub title: String,
    pub poll: Option<Poll>,
    pub subscribed: bool,
}
