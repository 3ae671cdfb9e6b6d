//! SQLite-backed interaction log.

use super::{Feedback, Interaction, InteractionLog, InteractionStatus};
use crate::error::{DeskbotError, Result};
use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS interactions (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    feedback TEXT,
    improvements TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_interactions_question ON interactions(question);
"#;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Interaction log stored in a local SQLite database.
pub struct SqliteInteractionLog {
    conn: Mutex<Connection>,
    offset: FixedOffset,
}

impl SqliteInteractionLog {
    /// Open (or create) the log at `path`. Dates are written at `utc_offset_hours`.
    #[instrument(skip_all)]
    pub fn new(path: &Path, utc_offset_hours: i32) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized interaction log at {:?}", path);
        Self::with_connection(conn, utc_offset_hours)
    }

    /// In-memory log, used by tests.
    pub fn in_memory(utc_offset_hours: i32) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Self::with_connection(conn, utc_offset_hours)
    }

    fn with_connection(conn: Connection, utc_offset_hours: i32) -> Result<Self> {
        let offset = utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                DeskbotError::Config(format!("Invalid UTC offset: {} hours", utc_offset_hours))
            })?;

        Ok(Self {
            conn: Mutex::new(conn),
            offset,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DeskbotError::InteractionLog(format!("Failed to acquire lock: {}", e)))
    }

    fn now(&self) -> String {
        Utc::now().with_timezone(&self.offset).format(DATE_FORMAT).to_string()
    }

    fn row_to_interaction(row: &rusqlite::Row) -> rusqlite::Result<Interaction> {
        let id: String = row.get(0)?;
        let feedback: Option<String> = row.get(4)?;
        let status: String = row.get(6)?;

        Ok(Interaction {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            date: row.get(1)?,
            question: row.get(2)?,
            answer: row.get(3)?,
            feedback: feedback.and_then(|f| f.parse().ok()),
            improvements: row.get(5)?,
            status: status.parse().unwrap_or(InteractionStatus::New),
        })
    }
}

#[async_trait]
impl InteractionLog for SqliteInteractionLog {
    #[instrument(skip(self, answer))]
    async fn log_interaction(&self, question: &str, answer: &str) -> Result<Interaction> {
        let interaction = Interaction {
            id: Uuid::new_v4(),
            date: self.now(),
            question: question.to_string(),
            answer: answer.to_string(),
            feedback: None,
            improvements: String::new(),
            status: InteractionStatus::New,
        };

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO interactions (id, date, question, answer, feedback, improvements, status)
            VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6)
            "#,
            params![
                interaction.id.to_string(),
                interaction.date,
                interaction.question,
                interaction.answer,
                interaction.improvements,
                interaction.status.as_str(),
            ],
        )?;

        debug!("Logged interaction {}", interaction.id);
        Ok(interaction)
    }

    #[instrument(skip(self))]
    async fn update_feedback(&self, question: &str, feedback: Feedback) -> Result<bool> {
        let conn = self.lock()?;

        let rowid: Option<i64> = conn
            .query_row(
                "SELECT rowid FROM interactions WHERE question = ?1 ORDER BY rowid LIMIT 1",
                params![question],
                |row| row.get(0),
            )
            .optional()?;

        let Some(rowid) = rowid else {
            debug!("No interaction found for feedback");
            return Ok(false);
        };

        conn.execute(
            "UPDATE interactions SET feedback = ?1, improvements = '', status = ?2 WHERE rowid = ?3",
            params![feedback.id(), feedback.status().as_str(), rowid],
        )?;

        info!("Recorded '{}' feedback ({})", feedback, feedback.status());
        Ok(true)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Interaction>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, date, question, answer, feedback, improvements, status
            FROM interactions
            ORDER BY rowid DESC
            LIMIT ?1
            "#,
        )?;

        let interactions = stmt
            .query_map(params![limit as i64], Self::row_to_interaction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(interactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_log_interaction_starts_as_new() {
        let log = SqliteInteractionLog::in_memory(8).unwrap();
        let logged = log.log_interaction("Where is my order?", "It shipped.").await.unwrap();

        assert_eq!(logged.status, InteractionStatus::New);
        assert!(logged.feedback.is_none());
        assert!(NaiveDateTime::parse_from_str(&logged.date, DATE_FORMAT).is_ok());

        let recent = log.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, logged.id);
        assert_eq!(recent[0].answer, "It shipped.");
    }

    #[tokio::test]
    async fn test_update_feedback_touches_first_match_only() {
        let log = SqliteInteractionLog::in_memory(8).unwrap();
        let first = log.log_interaction("Refunds?", "30 days").await.unwrap();
        let second = log.log_interaction("Refunds?", "Within a month").await.unwrap();

        assert!(log.update_feedback("Refunds?", Feedback::NotAccurate).await.unwrap());

        let recent = log.recent(10).await.unwrap();
        let updated = recent.iter().find(|i| i.id == first.id).unwrap();
        let untouched = recent.iter().find(|i| i.id == second.id).unwrap();

        assert_eq!(updated.feedback, Some(Feedback::NotAccurate));
        assert_eq!(updated.status, InteractionStatus::UpdateNeeded);
        assert_eq!(untouched.status, InteractionStatus::New);
    }

    #[tokio::test]
    async fn test_update_feedback_without_match() {
        let log = SqliteInteractionLog::in_memory(8).unwrap();
        log.log_interaction("Refunds?", "30 days").await.unwrap();

        assert!(!log.update_feedback("refunds?", Feedback::Accurate).await.unwrap());
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let log = SqliteInteractionLog::in_memory(0).unwrap();
        for q in ["one", "two", "three"] {
            log.log_interaction(q, "answer").await.unwrap();
        }

        let recent = log.recent(2).await.unwrap();
        let questions: Vec<_> = recent.iter().map(|i| i.question.as_str()).collect();
        assert_eq!(questions, vec!["three", "two"]);
    }

    #[tokio::test]
    async fn test_persists_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("interactions.db");

        {
            let log = SqliteInteractionLog::new(&path, 8).unwrap();
            log.log_interaction("Opening hours?", "9 to 5").await.unwrap();
        }

        let reopened = SqliteInteractionLog::new(&path, 8).unwrap();
        assert_eq!(reopened.recent(5).await.unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_impossible_offset() {
        assert!(matches!(
            SqliteInteractionLog::in_memory(30),
            Err(DeskbotError::Config(_))
        ));
        // would overflow i32 seconds
        assert!(matches!(
            SqliteInteractionLog::in_memory(i32::MAX),
            Err(DeskbotError::Config(_))
        ));
        assert!(SqliteInteractionLog::in_memory(-12).is_ok());
    }
}
