use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pathfinder_core::StudentContext;

use crate::error::StorageError;

/// One summarization cycle's worth of master-summary changes, applied as a
/// single-row upsert. Counters are deltas; prose fields replace.
#[derive(Debug, Clone)]
pub struct MasterUpdate {
    pub student_id: String,
    pub quick_context: String,
    pub recent_sessions: String,
    pub student_understanding: String,
    pub open_commitments: String,
    /// Added to `total_messages`.
    pub messages_delta: u64,
    pub updated_at: DateTime<Utc>,
}

/// Master-summary (StudentContext) operations.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Get the student's master summary, if one exists yet.
    async fn get_student_context(&self, student_id: &str)
        -> Result<Option<StudentContext>, StorageError>;

    /// Lazily create the record and bump `total_conversations` /
    /// `last_conversation_at`. Called once per created conversation.
    async fn record_conversation_started(
        &self,
        student_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Apply one summarization cycle's field values and message-count delta.
    /// Leaves objectives, deadlines and conversation counters untouched.
    async fn apply_master_update(&self, update: &MasterUpdate) -> Result<(), StorageError>;

    /// Students whose last conversation started at or after `since`, newest
    /// first. Drives the notification batch.
    async fn recently_active_students(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, StorageError>;
}
