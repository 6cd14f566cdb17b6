use async_trait::async_trait;
use pathfinder_core::Message;

use crate::error::StorageError;

/// Append-only message operations. Messages are immutable once created.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert one message row.
    async fn append_message(&self, message: &Message) -> Result<(), StorageError>;

    /// All messages of a conversation in creation order.
    async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StorageError>;
}
