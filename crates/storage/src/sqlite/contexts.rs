use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pathfinder_core::StudentContext;
use rusqlite::{Row, params};

use super::{Storage, parse_opt_ts, ts};
use crate::error::StorageError;
use crate::traits::{ContextStore, MasterUpdate};

fn read_string_list(raw: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn read_context(row: &Row<'_>) -> rusqlite::Result<StudentContext> {
    let generated_objectives: String = row.get(5)?;
    let upcoming_deadlines: String = row.get(6)?;
    let total_messages: i64 = row.get(8)?;

    Ok(StudentContext {
        student_id: row.get(0)?,
        quick_context: row.get(1)?,
        recent_sessions: row.get(2)?,
        student_understanding: row.get(3)?,
        open_commitments: row.get(4)?,
        generated_objectives: read_string_list(&generated_objectives)?,
        upcoming_deadlines: read_string_list(&upcoming_deadlines)?,
        total_conversations: row.get(7)?,
        total_messages: u64::try_from(total_messages).unwrap_or(0),
        last_conversation_at: parse_opt_ts(row.get(9)?)?,
        master_summary_updated_at: parse_opt_ts(row.get(10)?)?,
    })
}

#[async_trait]
impl ContextStore for Storage {
    async fn get_student_context(
        &self,
        student_id: &str,
    ) -> Result<Option<StudentContext>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT student_id, quick_context, recent_sessions, student_understanding,
                    open_commitments, generated_objectives, upcoming_deadlines,
                    total_conversations, total_messages, last_conversation_at,
                    master_summary_updated_at
             FROM student_contexts WHERE student_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![student_id], read_context)?;
        rows.next().transpose().map_err(StorageError::from)
    }

    async fn record_conversation_started(
        &self,
        student_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            r"INSERT INTO student_contexts (student_id, total_conversations, last_conversation_at)
              VALUES (?1, 1, ?2)
              ON CONFLICT(student_id) DO UPDATE SET
                  total_conversations = total_conversations + 1,
                  last_conversation_at = excluded.last_conversation_at",
            params![student_id, ts(now)],
        )?;
        Ok(())
    }

    async fn apply_master_update(&self, update: &MasterUpdate) -> Result<(), StorageError> {
        let messages_delta = i64::try_from(update.messages_delta).unwrap_or(i64::MAX);
        let conn = self.conn()?;
        conn.execute(
            r"INSERT INTO student_contexts
              (student_id, quick_context, recent_sessions, student_understanding,
               open_commitments, total_messages, master_summary_updated_at)
              VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
              ON CONFLICT(student_id) DO UPDATE SET
                  quick_context = excluded.quick_context,
                  recent_sessions = excluded.recent_sessions,
                  student_understanding = excluded.student_understanding,
                  open_commitments = excluded.open_commitments,
                  total_messages = student_contexts.total_messages + excluded.total_messages,
                  master_summary_updated_at = excluded.master_summary_updated_at",
            params![
                update.student_id,
                update.quick_context,
                update.recent_sessions,
                update.student_understanding,
                update.open_commitments,
                messages_delta,
                ts(update.updated_at),
            ],
        )?;
        Ok(())
    }

    async fn recently_active_students(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT student_id FROM student_contexts
             WHERE last_conversation_at >= ?1
             ORDER BY last_conversation_at DESC
             LIMIT ?2",
        )?;
        let ids = stmt
            .query_map(params![ts(since), limit], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }
}
