use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{Forum, ForumError, Poll, Thread};
use crate::db::{parse_timestamp, Database, StoreError};

/// Read access to forums, threads and polls.
pub struct ForumManager {
    db: Database,
}

impl ForumManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create_forum(
        &self,
        name: &str,
        min_class_read: u32,
        min_class_write: u32,
        min_class_create: u32,
    ) -> Result<Forum, StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO forums (name, min_class_read, min_class_write, min_class_create)
             VALUES (?, ?, ?, ?)",
            params![name, min_class_read, min_class_write, min_class_create],
        )?;
        Ok(Forum {
            id: conn.last_insert_rowid() as u32,
            name: name.to_string(),
            min_class_read,
            min_class_write,
            min_class_create,
        })
    }

    pub fn find_by_id(&self, id: u32) -> Result<Option<Forum>, ForumError> {
        let conn = self.db.lock()?;
        Ok(load_forum(&conn, id)?)
    }

    pub fn find_thread(&self, id: u32) -> Result<Option<Thread>, ForumError> {
        let conn = self.db.lock()?;
        let thread = conn
            .query_row(
                "SELECT id, forum_id, title, author_id, num_posts, last_post_id, created_time
                 FROM forums_topics WHERE id = ?",
                params![id],
                |row| {
                    let created: String = row.get(6)?;
                    Ok(Thread {
                        id: row.get(0)?,
                        forum_id: row.get(1)?,
                        title: row.get(2)?,
                        author_id: row.get(3)?,
                        num_posts: row.get(4)?,
                        last_post_id: row.get(5)?,
                        created: parse_timestamp(&created).unwrap_or_else(Utc::now),
                    })
                },
            )
            .optional()?;
        Ok(thread)
    }

    pub fn poll(&self, thread_id: u32) -> Result<Option<Poll>, ForumError> {
        let conn = self.db.lock()?;
        Ok(load_poll(&conn, thread_id)?)
    }

    pub fn is_subscribed(&self, user_id: u32, thread_id: u32) -> Result<bool, ForumError> {
        let conn = self.db.lock()?;
        let subscribed = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM users_subscriptions WHERE user_id = ? AND topic_id = ?)",
            params![user_id, thread_id],
            |row| row.get(0),
        )?;
        Ok(subscribed)
    }
}

pub(super) fn load_forum(conn: &Connection, id: u32) -> rusqlite::Result<Option<Forum>> {
    conn.query_row(
        "SELECT id, name, min_class_read, min_class_write, min_class_create FROM forums WHERE id = ?",
        params![id],
        |row| {
            Ok(Forum {
                id: row.get(0)?,
                name: row.get(1)?,
                min_class_read: row.get(2)?,
                min_class_write: row.get(3)?,
                min_class_create: row.get(4)?,
            })
        },
    )
    .optional()
}

/// Poll with vote counts. Every answer is present in `votes`, zero if unvoted.
pub(super) fn load_poll(conn: &Connection, thread_id: u32) -> rusqlite::Result<Option<Poll>> {
    let row = conn
        .query_row(
            "SELECT question, answers, closed FROM forums_polls WHERE topic_id = ?",
            params![thread_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                ))
            },
        )
        .optional()?;
    let Some((question, answers_json, closed)) = row else {
        return Ok(None);
    };

    let answers: BTreeMap<u32, String> = serde_json::from_str(&answers_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let mut votes: BTreeMap<u32, u32> = answers.keys().map(|k| (*k, 0)).collect();

    let mut stmt = conn.prepare(
        "SELECT vote, COUNT(*) FROM forums_polls_votes WHERE topic_id = ? GROUP BY vote",
    )?;
    let counts = stmt.query_map(params![thread_id], |row| {
        Ok((row.get::<_, u32>(0)?, row.get::<_, u32>(1)?))
    })?;
    for count in counts {
        let (vote, n) = count?;
        if let Some(slot) = votes.get_mut(&vote) {
            *slot = n;
        }
    }

    Ok(Some(Poll {
        thread_id,
        question,
        answers,
        votes,
        closed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_find_forum() {
        let forums = ForumManager::new(Database::in_memory().unwrap());
        let forum = forums.create_forum("General", 100, 150, 200).unwrap();
        assert_eq!(forums.find_by_id(forum.id).unwrap(), Some(forum));
        assert!(forums.find_by_id(999).unwrap().is_none());
    }

    #[test]
    fn test_missing_thread_and_poll() {
        let forums = ForumManager::new(Database::in_memory().unwrap());
        assert!(forums.find_thread(1).unwrap().is_none());
        assert!(forums.poll(1).unwrap().is_none());
        assert!(!forums.is_subscribed(1, 1).unwrap());
    }

    #[test]
    fn test_poll_vote_counts() {
        let db = Database::in_memory().unwrap();
        {
            let conn = db.lock().unwrap();
            conn.execute(
                "INSERT INTO forums_polls (topic_id, question, answers) VALUES (7, 'Best?', ?)",
                params![r#"{"1":"Yes","3":"No"}"#],
            )
            .unwrap();
            conn.execute_batch(
                "INSERT INTO forums_polls_votes (topic_id, user_id, vote) VALUES (7, 1, 3);
                 INSERT INTO forums_polls_votes (topic_id, user_id, vote) VALUES (7, 2, 3);
                 INSERT INTO forums_polls_votes (topic_id, user_id, vote) VALUES (7, 3, 9);",
            )
            .unwrap();
        }
        let poll = ForumManager::new(db).poll(7).unwrap().unwrap();
        assert_eq!(poll.question, "Best?");
        assert_eq!(poll.answers.get(&3).map(String::as_str), Some("No"));
        assert_eq!(poll.votes, BTreeMap::from([(1, 0), (3, 2)]));
        assert!(!poll.closed);
    }
}
