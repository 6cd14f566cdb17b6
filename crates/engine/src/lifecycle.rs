//! Conversation lifecycle: resuming, creating, ending, and finding
//! conversations overdue for summarization.

use std::sync::Arc;

use chrono::Utc;
use pathfinder_core::{Conversation, Message, MessageRole, is_active};
use pathfinder_storage::{AdvisorStore, ContextStore, ConversationStore, MessageStore};
use uuid::Uuid;

use crate::error::EngineError;

/// Result of [`ConversationLifecycle::get_or_create_active`].
#[derive(Debug, Clone)]
pub struct ActiveConversation {
    pub conversation: Conversation,
    pub is_new: bool,
    /// Unsummarized, non-empty conversations that fell out of the window:
    /// candidates the caller should forward to the summarization pipeline as
    /// an opportunistic side effect of this call.
    pub stale_conversation_ids: Vec<String>,
}

/// Owns the state machine for a student's conversation sessions. Activity is
/// decided by a query over timestamps, not a stored flag, so exactly one
/// conversation is treated as active per student at any instant.
pub struct ConversationLifecycle {
    storage: Arc<dyn AdvisorStore>,
    active_window: chrono::Duration,
}

impl ConversationLifecycle {
    #[must_use]
    pub fn new(storage: Arc<dyn AdvisorStore>, active_window: chrono::Duration) -> Self {
        Self { storage, active_window }
    }

    /// Resume the student's active conversation or start a new one.
    ///
    /// An ended conversation is never resumed, even when its last message is
    /// still inside the window. Two tabs racing here within the window may
    /// both create a conversation; that duplicate is accepted rather than
    /// guarded with an atomic check-and-create, and each copy summarizes
    /// independently.
    pub async fn get_or_create_active(
        &self,
        student_id: &str,
        mode: &str,
    ) -> Result<ActiveConversation, EngineError> {
        let now = Utc::now();

        let existing = self.storage.find_latest_open(student_id).await?;
        let (conversation, is_new) = match existing {
            Some(open) if is_active(&open, now, self.active_window) => (open, false),
            _ => {
                let conversation = Conversation::new(
                    Uuid::new_v4().to_string(),
                    student_id.to_owned(),
                    mode.to_owned(),
                    now,
                );
                self.storage.create_conversation(&conversation).await?;
                self.storage.record_conversation_started(student_id, now).await?;
                tracing::debug!(student_id, conversation_id = %conversation.id, "started conversation");
                (conversation, true)
            }
        };

        let cutoff = now - self.active_window;
        let stale_conversation_ids = self
            .storage
            .stale_unsummarized_for_student(student_id, cutoff)
            .await?
            .into_iter()
            .filter(|id| *id != conversation.id)
            .collect();

        Ok(ActiveConversation { conversation, is_new, stale_conversation_ids })
    }

    /// Mark a conversation ended. Best-effort and idempotent: invoked from
    /// unreliable client signals (page unload), so a missing row, an already
    /// set `ended_at`, or a store failure is logged and swallowed.
    pub async fn mark_ended(&self, conversation_id: &str) {
        match self.storage.mark_ended(conversation_id, Utc::now()).await {
            Ok(true) => tracing::debug!(conversation_id, "conversation ended"),
            Ok(false) => {
                tracing::debug!(conversation_id, "end signal for missing or already-ended conversation");
            }
            Err(e) => {
                tracing::warn!(conversation_id, error = %e, "failed to mark conversation ended");
            }
        }
    }

    /// Bump `last_message_at` and `message_count` by exactly one. Called once
    /// per persisted message row. A missing conversation is a programming
    /// error and surfaces.
    pub async fn record_activity(&self, conversation_id: &str) -> Result<(), EngineError> {
        self.storage.record_activity(conversation_id, Utc::now()).await?;
        Ok(())
    }

    /// Persist one message and record its activity: the ingestion path the
    /// chat route uses per user and per assistant turn.
    pub async fn append_message(
        &self,
        conversation_id: &str,
        role: MessageRole,
        content: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<Message, EngineError> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_owned(),
            role,
            content: content.to_owned(),
            metadata,
            created_at: Utc::now(),
        };
        self.storage.append_message(&message).await?;
        self.storage.record_activity(conversation_id, message.created_at).await?;
        Ok(message)
    }

    /// Global sweep query for conversations overdue for summarization,
    /// oldest first.
    pub async fn find_summarization_candidates(
        &self,
        limit: usize,
    ) -> Result<Vec<(String, String)>, EngineError> {
        let cutoff = Utc::now() - self.active_window;
        Ok(self.storage.summarization_candidates(cutoff, limit).await?)
    }
}
