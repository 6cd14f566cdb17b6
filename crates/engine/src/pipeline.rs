//! Background summarization: per-conversation digests folded into the
//! durable master summary, at-least-once with idempotent skip.

use std::sync::Arc;

use chrono::Utc;
use pathfinder_core::constants::{PRIOR_SUMMARIES_FOR_MERGE, TRANSCRIPT_CHAR_BUDGET};
use pathfinder_core::{Parsed, StudentContext, quick_context, render_transcript};
use pathfinder_llm::{AdvisorModel, MasterMergeInput, conversation_digest, merge_master_fields};
use pathfinder_storage::{AdvisorStore, ContextStore, ConversationStore, MasterUpdate, MessageStore, ProfileStore};

use crate::error::EngineError;

/// What one summarization attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarizeOutcome {
    /// Digest written and master summary updated.
    Summarized,
    /// A summary was already present (or landed concurrently); nothing done.
    AlreadySummarized,
    /// Zero messages; nothing worth summarizing.
    Empty,
    /// The conversation row no longer exists.
    Missing,
}

/// Counts from one catch-up sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    pub summarized: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// The fire-and-forget summarization pipeline. The optimistic trigger
/// ([`Self::enqueue`]) and the periodic catch-up sweep
/// ([`Self::process_pending`]) are two call sites of the same idempotent
/// [`Self::summarize_one`].
///
/// Cheap to clone: clones share the same store and model.
#[derive(Clone)]
pub struct SummarizationPipeline {
    storage: Arc<dyn AdvisorStore>,
    model: Arc<dyn AdvisorModel>,
    active_window: chrono::Duration,
}

impl SummarizationPipeline {
    #[must_use]
    pub fn new(
        storage: Arc<dyn AdvisorStore>,
        model: Arc<dyn AdvisorModel>,
        active_window: chrono::Duration,
    ) -> Self {
        Self { storage, model, active_window }
    }

    /// Detached summarization trigger. Errors are logged, never propagated:
    /// the conversation stays unsummarized and the next sweep retries it.
    /// The handle is returned for callers that want to await in tests;
    /// production callers drop it.
    pub fn enqueue(
        &self,
        conversation_id: &str,
        student_id: &str,
    ) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        let conversation_id = conversation_id.to_owned();
        let student_id = student_id.to_owned();
        tokio::spawn(async move {
            match this.summarize_one(&conversation_id, &student_id).await {
                Ok(outcome) => {
                    tracing::debug!(conversation_id, ?outcome, "summarization finished");
                }
                Err(e) => {
                    tracing::warn!(
                        conversation_id,
                        error = %e,
                        "summarization failed; conversation left for catch-up sweep"
                    );
                }
            }
        })
    }

    /// Summarize one finished conversation and fold it into the student's
    /// master summary.
    ///
    /// Idempotent: re-running against an already-summarized conversation is
    /// a no-op, both via the upfront check and via the guarded write. A
    /// failed attempt leaves no partial summary behind; the conversation
    /// remains eligible for retry.
    pub async fn summarize_one(
        &self,
        conversation_id: &str,
        student_id: &str,
    ) -> Result<SummarizeOutcome, EngineError> {
        let Some(conversation) = self.storage.get_conversation(conversation_id).await? else {
            tracing::warn!(conversation_id, "summarization candidate no longer exists");
            return Ok(SummarizeOutcome::Missing);
        };
        if conversation.summary.is_some() {
            return Ok(SummarizeOutcome::AlreadySummarized);
        }

        let messages = self.storage.get_messages(conversation_id).await?;
        if messages.is_empty() {
            return Ok(SummarizeOutcome::Empty);
        }

        let transcript = render_transcript(&messages, TRANSCRIPT_CHAR_BUDGET);
        let digest = match conversation_digest(self.model.as_ref(), &transcript, &conversation.mode)
            .await?
        {
            Parsed::Value(digest) => digest,
            Parsed::Fallback { value, reason } => {
                tracing::warn!(conversation_id, reason, "digest fell back to raw model text");
                value
            }
        };

        let now = Utc::now();
        let wrote = self
            .storage
            .set_summary_if_absent(
                conversation_id,
                &digest.advisor_summary,
                &digest.user_summary,
                now,
            )
            .await?;
        if !wrote {
            tracing::debug!(conversation_id, "summary landed concurrently; skipping merge");
            return Ok(SummarizeOutcome::AlreadySummarized);
        }

        // Trust the row's student id over the trigger's.
        if conversation.student_id != student_id {
            tracing::warn!(
                conversation_id,
                row_student = %conversation.student_id,
                caller_student = %student_id,
                "summarization trigger carried a mismatched student id"
            );
        }

        self.fold_into_master(
            &conversation.student_id,
            conversation_id,
            &digest,
            u64::from(conversation.message_count),
            now,
        )
        .await?;

        tracing::info!(
            conversation_id,
            messages = conversation.message_count,
            "conversation summarized"
        );
        Ok(SummarizeOutcome::Summarized)
    }

    async fn fold_into_master(
        &self,
        student_id: &str,
        conversation_id: &str,
        digest: &pathfinder_llm::ConversationDigest,
        messages_delta: u64,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let profile = self.storage.get_profile(student_id).await?;
        let existing = self
            .storage
            .get_student_context(student_id)
            .await?
            .unwrap_or_else(|| StudentContext::empty(student_id));
        let priors = self
            .storage
            .prior_summaries(student_id, conversation_id, PRIOR_SUMMARIES_FOR_MERGE)
            .await?;

        let merge_input = MasterMergeInput {
            existing_recent_sessions: &existing.recent_sessions,
            existing_understanding: &existing.student_understanding,
            existing_commitments: &existing.open_commitments,
            new_summary: &digest.advisor_summary,
            new_summary_date: now,
            prior_summaries: &priors,
        };
        let merged = merge_master_fields(self.model.as_ref(), &merge_input).await;
        if let Parsed::Fallback { reason, .. } = &merged {
            tracing::warn!(student_id, reason, "master merge degraded to deterministic fallback");
        }
        let fields = merged.into_value();

        let update = MasterUpdate {
            student_id: student_id.to_owned(),
            quick_context: quick_context(profile.as_ref()),
            recent_sessions: fields.recent_sessions,
            student_understanding: fields.student_understanding,
            open_commitments: fields.open_commitments,
            messages_delta,
            updated_at: now,
        };
        self.storage.apply_master_update(&update).await?;
        Ok(())
    }

    /// Catch-up sweep: summarize pending conversations sequentially, oldest
    /// first so no single student's backlog starves others. Per-item
    /// failures are logged and skipped.
    pub async fn process_pending(&self, limit: usize) -> Result<SweepReport, EngineError> {
        let cutoff = Utc::now() - self.active_window;
        let candidates = self.storage.summarization_candidates(cutoff, limit).await?;

        let mut report = SweepReport::default();
        for (conversation_id, student_id) in candidates {
            match self.summarize_one(&conversation_id, &student_id).await {
                Ok(SummarizeOutcome::Summarized) => report.summarized += 1,
                Ok(_) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        conversation_id,
                        error = %e,
                        "sweep item failed; leaving for next sweep"
                    );
                }
            }
        }
        Ok(report)
    }
}
