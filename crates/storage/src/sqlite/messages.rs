use async_trait::async_trait;
use pathfinder_core::{Message, MessageRole};
use rusqlite::{Row, params};

use super::{Storage, parse_ts, ts};
use crate::error::StorageError;
use crate::traits::MessageStore;

fn read_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get(2)?;
    let role: MessageRole = role
        .parse()
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    let metadata: Option<String> = row.get(4)?;
    let metadata = metadata
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    let created_at: String = row.get(5)?;

    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        role,
        content: row.get(3)?,
        metadata,
        created_at: parse_ts(&created_at)?,
    })
}

#[async_trait]
impl MessageStore for Storage {
    async fn append_message(&self, message: &Message) -> Result<(), StorageError> {
        let metadata = message.metadata.as_ref().map(serde_json::to_string).transpose()?;
        let conn = self.conn()?;
        conn.execute(
            r"INSERT INTO messages (id, conversation_id, role, content, metadata, created_at)
              VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id,
                message.conversation_id,
                message.role.as_str(),
                message.content,
                metadata,
                ts(message.created_at),
            ],
        )?;
        Ok(())
    }

    async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, role, content, metadata, created_at
             FROM messages
             WHERE conversation_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let messages = stmt
            .query_map(params![conversation_id], read_message)?
            .collect::<rusqlite::Result<Vec<Message>>>()?;
        Ok(messages)
    }
}
