//! New thread submission, with an optional poll.

use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::params;
use tracing::info;

use super::manager::{load_forum, load_poll};
use super::{CreatedThread, ForumError, NewThread};
use crate::config::{IrcConfig, SiteConfig};
use crate::db::{timestamp, Database};
use crate::metrics;
use crate::notify::NotifyHandle;
use crate::user::{Viewer, FORUMS_POLLS_CREATE};

pub const MAX_TITLE_LENGTH: usize = 150;
pub const MAX_POLL_ANSWERS: usize = 25;

/// Key answers by their 1-based position in the submitted list.
///
/// Blank entries are skipped without renumbering the ones after them.
pub fn build_poll_answers(answers: &[String]) -> Result<BTreeMap<u32, String>, ForumError> {
    let keyed: BTreeMap<u32, String> = answers
        .iter()
        .enumerate()
        .filter_map(|(i, answer)| {
            let answer = answer.trim();
            (!answer.is_empty()).then(|| (i as u32 + 1, answer.to_string()))
        })
        .collect();

    if keyed.len() < 2 {
        return Err(ForumError::Validation(
            "You cannot create a poll with only one answer.".to_string(),
        ));
    }
    if keyed.len() > MAX_POLL_ANSWERS {
        return Err(ForumError::Validation(
            "You cannot create a poll with greater than 25 answers.".to_string(),
        ));
    }
    Ok(keyed)
}

/// Creates threads and announces staff polls on the moderation channel.
pub struct ThreadCreator {
    db: Database,
    notify: NotifyHandle,
    site_url: String,
    staff_forum_id: Option<u32>,
    mod_channel: String,
}

impl ThreadCreator {
    pub fn new(db: Database, notify: NotifyHandle, site: &SiteConfig, irc: &IrcConfig) -> Self {
        Self {
            db,
            notify,
            site_url: site.site_url.trim_end_matches('/').to_string(),
            staff_forum_id: site.staff_forum_id,
            mod_channel: irc.mod_channel.clone(),
        }
    }

    pub fn create(&self, viewer: &Viewer, new: NewThread) -> Result<CreatedThread, ForumError> {
        if viewer.disable_posting {
            return Err(ForumError::Forbidden(
                "Your posting privileges have been removed.".to_string(),
            ));
        }

        let mut conn = self.db.lock()?;
        let forum = load_forum(&conn, new.forum_id)?
            .ok_or_else(|| ForumError::NotFound(format!("Forum {} not found", new.forum_id)))?;
        if !viewer.write_access(&forum) || !viewer.create_access(&forum) {
            return Err(ForumError::Forbidden(
                "You are not allowed to create threads in this forum.".to_string(),
            ));
        }

        let title = new.title.trim();
        let body = new.body.trim();
        if title.is_empty() || body.is_empty() {
            return Err(ForumError::Validation(
                "A thread needs both a title and a body.".to_string(),
            ));
        }
        let title: String = title.chars().take(MAX_TITLE_LENGTH).collect();

        let question = new
            .question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let poll = match question {
            Some(q) if !new.answers.is_empty() && viewer.permitted(FORUMS_POLLS_CREATE) => {
                Some((q.to_string(), build_poll_answers(&new.answers)?))
            }
            _ => None,
        };

        let now = timestamp(Utc::now());
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO forums_topics (forum_id, title, author_id, num_posts, last_post_author_id, last_post_time, created_time)
             VALUES (?1, ?2, ?3, 1, ?3, ?4, ?4)",
            params![forum.id, title, viewer.id, now],
        )?;
        let thread_id = tx.last_insert_rowid() as u32;

        tx.execute(
            "INSERT INTO forums_posts (topic_id, author_id, body, added_time) VALUES (?, ?, ?, ?)",
            params![thread_id, viewer.id, body, now],
        )?;
        let post_id = tx.last_insert_rowid() as u32;

        tx.execute(
            "UPDATE forums_topics SET last_post_id = ? WHERE id = ?",
            params![post_id, thread_id],
        )?;
        tx.execute(
            "UPDATE forums SET num_topics = num_topics + 1, num_posts = num_posts + 1,
                    last_topic_id = ?1, last_post_id = ?2, last_post_author_id = ?3, last_post_time = ?4
             WHERE id = ?5",
            params![thread_id, post_id, viewer.id, now, forum.id],
        )?;

        if let Some((question, answers)) = &poll {
            let answers_json = serde_json::to_string(answers)
                .map_err(|e| ForumError::Validation(format!("Invalid poll answers: {}", e)))?;
            tx.execute(
                "INSERT INTO forums_polls (topic_id, question, answers) VALUES (?, ?, ?)",
                params![thread_id, question, answers_json],
            )?;
        }
        if new.subscribe {
            tx.execute(
                "INSERT OR IGNORE INTO users_subscriptions (user_id, topic_id) VALUES (?, ?)",
                params![viewer.id, thread_id],
            )?;
        }
        tx.commit()?;

        let created_poll = match poll {
            Some(_) => load_poll(&conn, thread_id)?,
            None => None,
        };
        drop(conn);

        metrics::THREADS_CREATED.inc();
        info!(thread_id, forum_id = forum.id, user_id = viewer.id, "Thread created");

        if let Some(poll) = &created_poll {
            metrics::POLLS_CREATED.inc();
            info!(thread_id, answers = poll.answers.len(), "Poll created");
            if self.staff_forum_id == Some(forum.id) {
                self.notify.privmsg(
                    &self.mod_channel,
                    &format!(
                        "Poll created by {}: \"{}\" {}/forums.php?action=viewthread&threadid={}",
                        viewer.username, poll.question, self.site_url, thread_id
                    ),
                );
            }
        }

        Ok(CreatedThread {
            thread_id,
            forum_id: forum.id,
            post_id,
            title,
            poll: created_poll,
            subscribed: new.subscribe,
        })
    }
}
