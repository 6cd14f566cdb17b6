use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pathfinder_core::{Conversation, UserSummary};

use crate::error::StorageError;

/// Conversation lifecycle operations.
///
/// Activity is a property of timestamps, never a stored flag: the "active"
/// decision is made by the caller over rows returned here.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Insert a freshly created conversation.
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), StorageError>;

    /// Get a conversation by id.
    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StorageError>;

    /// The student's most recently active conversation with `ended_at` null,
    /// regardless of window. The caller applies the activity predicate.
    async fn find_latest_open(&self, student_id: &str)
        -> Result<Option<Conversation>, StorageError>;

    /// Set `ended_at` unless already set. Returns whether a row changed;
    /// a missing or already-ended conversation is `false`, not an error.
    async fn mark_ended(&self, id: &str, now: DateTime<Utc>) -> Result<bool, StorageError>;

    /// Bump `last_message_at` to `now` and increment `message_count` by one.
    /// A missing row is a `NotFound` error: callers hold ids they just
    /// created or resumed, so absence is a programming error.
    async fn record_activity(&self, id: &str, now: DateTime<Utc>) -> Result<(), StorageError>;

    /// Write the summary pair, guarded so a concurrent duplicate run cannot
    /// overwrite a summary that already landed. Returns `false` when a
    /// summary was already present (the write was skipped).
    async fn set_summary_if_absent(
        &self,
        id: &str,
        summary: &str,
        summary_for_user: &UserSummary,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// Ids of this student's conversations with no summary, at least one
    /// message, and either explicitly ended or last active before `cutoff`.
    /// Oldest first.
    async fn stale_unsummarized_for_student(
        &self,
        student_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<String>, StorageError>;

    /// Global sweep query: `(conversation_id, student_id)` pairs with no
    /// summary, at least one message, ended or last active before `cutoff`.
    /// Oldest first, capped at `limit`.
    async fn summarization_candidates(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(String, String)>, StorageError>;

    /// The student's most recent prior conversation summaries (newest first),
    /// excluding `exclude_id`, as `(summarized_at, summary)` pairs.
    async fn prior_summaries(
        &self,
        student_id: &str,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<(DateTime<Utc>, String)>, StorageError>;
}
