use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pathfinder_core::{Conversation, UserSummary};
use rusqlite::{Row, params};

use super::{Storage, opt_ts, parse_opt_ts, parse_ts, ts};
use crate::error::StorageError;
use crate::traits::ConversationStore;

const CONVERSATION_COLS: &str = "id, student_id, mode, started_at, last_message_at, ended_at, \
                                 message_count, summary, summary_for_user, summary_updated_at";

fn read_conversation(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    let started_at: String = row.get(3)?;
    let summary_for_user: Option<String> = row.get(8)?;
    let summary_for_user: Option<UserSummary> = summary_for_user
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    Ok(Conversation {
        id: row.get(0)?,
        student_id: row.get(1)?,
        mode: row.get(2)?,
        started_at: parse_ts(&started_at)?,
        last_message_at: parse_opt_ts(row.get(4)?)?,
        ended_at: parse_opt_ts(row.get(5)?)?,
        message_count: row.get(6)?,
        summary: row.get(7)?,
        summary_for_user,
        summary_updated_at: parse_opt_ts(row.get(9)?)?,
    })
}

#[async_trait]
impl ConversationStore for Storage {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            r"INSERT INTO conversations
              (id, student_id, mode, started_at, last_message_at, ended_at,
               message_count, summary, summary_for_user, summary_updated_at)
              VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                conversation.id,
                conversation.student_id,
                conversation.mode,
                ts(conversation.started_at),
                opt_ts(conversation.last_message_at),
                opt_ts(conversation.ended_at),
                conversation.message_count,
                conversation.summary,
                conversation
                    .summary_for_user
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                opt_ts(conversation.summary_updated_at),
            ],
        )?;
        Ok(())
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {CONVERSATION_COLS} FROM conversations WHERE id = ?1"))?;
        let mut rows = stmt.query_map(params![id], read_conversation)?;
        rows.next().transpose().map_err(StorageError::from)
    }

    async fn find_latest_open(
        &self,
        student_id: &str,
    ) -> Result<Option<Conversation>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONVERSATION_COLS} FROM conversations
             WHERE student_id = ?1 AND ended_at IS NULL
             ORDER BY COALESCE(last_message_at, started_at) DESC
             LIMIT 1"
        ))?;
        let mut rows = stmt.query_map(params![student_id], read_conversation)?;
        rows.next().transpose().map_err(StorageError::from)
    }

    async fn mark_ended(&self, id: &str, now: DateTime<Utc>) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE conversations SET ended_at = ?1 WHERE id = ?2 AND ended_at IS NULL",
            params![ts(now), id],
        )?;
        Ok(changed > 0)
    }

    async fn record_activity(&self, id: &str, now: DateTime<Utc>) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE conversations
             SET last_message_at = ?1, message_count = message_count + 1
             WHERE id = ?2",
            params![ts(now), id],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound { entity: "conversation", id: id.to_owned() });
        }
        Ok(())
    }

    async fn set_summary_if_absent(
        &self,
        id: &str,
        summary: &str,
        summary_for_user: &UserSummary,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let user_json = serde_json::to_string(summary_for_user)?;
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE conversations
             SET summary = ?1, summary_for_user = ?2, summary_updated_at = ?3
             WHERE id = ?4 AND summary IS NULL",
            params![summary, user_json, ts(now), id],
        )?;
        Ok(changed > 0)
    }

    async fn stale_unsummarized_for_student(
        &self,
        student_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<String>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM conversations
             WHERE student_id = ?1
               AND summary IS NULL
               AND message_count > 0
               AND (ended_at IS NOT NULL OR COALESCE(last_message_at, started_at) < ?2)
             ORDER BY COALESCE(last_message_at, started_at) ASC",
        )?;
        let ids = stmt
            .query_map(params![student_id, ts(cutoff)], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    async fn summarization_candidates(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(String, String)>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, student_id FROM conversations
             WHERE summary IS NULL
               AND message_count > 0
               AND (ended_at IS NOT NULL OR COALESCE(last_message_at, started_at) < ?1)
             ORDER BY COALESCE(last_message_at, started_at) ASC
             LIMIT ?2",
        )?;
        let pairs = stmt
            .query_map(params![ts(cutoff), limit], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
        Ok(pairs)
    }

    async fn prior_summaries(
        &self,
        student_id: &str,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<(DateTime<Utc>, String)>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT COALESCE(summary_updated_at, started_at), summary FROM conversations
             WHERE student_id = ?1 AND summary IS NOT NULL AND id <> ?2
             ORDER BY COALESCE(last_message_at, started_at) DESC
             LIMIT ?3",
        )?;
        let pairs = stmt
            .query_map(params![student_id, exclude_id, limit], |row| {
                let at: String = row.get(0)?;
                Ok((parse_ts(&at)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<(DateTime<Utc>, String)>>>()?;
        Ok(pairs)
    }
}
