//! Batch notification decisions: the lighter-weight sibling of the
//! summarization pipeline, same LLM-assisted-decision-with-degradation
//! pattern.

use std::sync::Arc;

use chrono::Utc;
use pathfinder_core::Parsed;
use pathfinder_core::constants::{NOTIFICATION_HORIZON_DAYS, UPCOMING_DEADLINES_LIMIT};
use pathfinder_llm::{AdvisorModel, decide_notification};
use pathfinder_storage::{AdvisorStore, ContextStore, ProfileStore};

use crate::error::EngineError;

/// A notification the host should deliver to one student.
#[derive(Debug, Clone)]
pub struct StudentNotification {
    pub student_id: String,
    pub title: String,
    pub body: String,
}

/// Result of one notification batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub notifications: Vec<StudentNotification>,
    pub considered: usize,
    /// Students whose decision degraded to silence on a model failure.
    pub degraded: usize,
}

/// Decides, per recently-active student, whether to send a nudge.
pub struct NotificationEngine {
    storage: Arc<dyn AdvisorStore>,
    model: Arc<dyn AdvisorModel>,
}

impl NotificationEngine {
    #[must_use]
    pub fn new(storage: Arc<dyn AdvisorStore>, model: Arc<dyn AdvisorModel>) -> Self {
        Self { storage, model }
    }

    /// Run the batch over students active within the default horizon.
    /// Per-student failures degrade to "no notification"; only a failure to
    /// list students at all surfaces.
    pub async fn run_batch(&self, limit: usize) -> Result<BatchOutcome, EngineError> {
        let since = Utc::now() - chrono::Duration::days(NOTIFICATION_HORIZON_DAYS);
        let students = self.storage.recently_active_students(since, limit).await?;

        let mut outcome = BatchOutcome::default();
        for student_id in students {
            outcome.considered += 1;
            match self.decide_for_student(&student_id).await {
                Ok(Some(notification)) => outcome.notifications.push(notification),
                Ok(None) => {}
                Err(e) => {
                    outcome.degraded += 1;
                    tracing::warn!(student_id, error = %e, "notification decision failed");
                }
            }
        }
        Ok(outcome)
    }

    /// Decide for one student. `None` when there is nothing to say, the
    /// model declined, or the decision degraded.
    pub async fn decide_for_student(
        &self,
        student_id: &str,
    ) -> Result<Option<StudentNotification>, EngineError> {
        let Some(context) = self.storage.get_student_context(student_id).await? else {
            return Ok(None);
        };
        let deadlines = self
            .storage
            .get_upcoming_deadlines(student_id, Utc::now(), UPCOMING_DEADLINES_LIMIT)
            .await?;

        let mut bundle = String::new();
        if !context.quick_context.is_empty() {
            bundle.push_str(&context.quick_context);
            bundle.push('\n');
        }
        if !context.open_commitments.is_empty() {
            bundle.push_str("Open commitments: ");
            bundle.push_str(&context.open_commitments);
            bundle.push('\n');
        }
        for deadline in &deadlines {
            bundle.push_str(&format!(
                "Deadline {}: {}\n",
                deadline.due_date.format("%Y-%m-%d"),
                deadline.title
            ));
        }
        if bundle.is_empty() {
            return Ok(None);
        }

        let decision = decide_notification(self.model.as_ref(), &bundle).await;
        if let Parsed::Fallback { reason, .. } = &decision {
            tracing::debug!(student_id, reason, "notification decision degraded to silence");
        }
        let decision = decision.into_value();

        if !decision.should_notify {
            return Ok(None);
        }
        match (decision.title, decision.body) {
            (Some(title), Some(body)) => {
                Ok(Some(StudentNotification { student_id: student_id.to_owned(), title, body }))
            }
            // A notify verdict without content is malformed output; stay silent.
            _ => Ok(None),
        }
    }
}
