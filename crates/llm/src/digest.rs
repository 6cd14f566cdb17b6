//! Domain generation calls: conversation digest, master-summary merge, and
//! the notification decision.
//!
//! Each call enforces its own timeout and classifies failures the way the
//! pipeline needs them: transport failures on the digest propagate (the
//! conversation stays unsummarized and is retried by the catch-up sweep),
//! while merge and notification failures always degrade to a deterministic
//! result.

use chrono::{DateTime, Utc};
use pathfinder_core::constants::{
    CONVERSATION_SUMMARY_WORD_BUDGET, LLM_CALL_TIMEOUT_SECS, MASTER_FIELD_WORD_BUDGET,
    RECENT_SESSIONS_FALLBACK_CHARS,
};
use pathfinder_core::{Parsed, UserSummary, parse_or_default, strip_markdown_fence};

use crate::ai_types::{DigestJson, MergeJson, NotificationJson};
use crate::client::truncate_chars;
use crate::error::LlmError;
use crate::model::AdvisorModel;

/// Both summaries produced from one finished conversation.
#[derive(Debug, Clone)]
pub struct ConversationDigest {
    /// Advisor-facing prose digest.
    pub advisor_summary: String,
    /// Student-facing structured digest.
    pub user_summary: UserSummary,
}

/// The three merged master-summary prose fields.
#[derive(Debug, Clone)]
pub struct MasterFields {
    pub recent_sessions: String,
    pub student_understanding: String,
    pub open_commitments: String,
}

/// Inputs to the summarize-of-summaries merge.
#[derive(Debug, Clone)]
pub struct MasterMergeInput<'a> {
    pub existing_recent_sessions: &'a str,
    pub existing_understanding: &'a str,
    pub existing_commitments: &'a str,
    /// The newly produced conversation summary being folded in.
    pub new_summary: &'a str,
    pub new_summary_date: DateTime<Utc>,
    /// Up to the last few prior conversation summaries, newest first.
    pub prior_summaries: &'a [(DateTime<Utc>, String)],
}

/// Outcome of the batch notification ask for one student.
#[derive(Debug, Clone)]
pub struct NotificationDecision {
    pub should_notify: bool,
    pub title: Option<String>,
    pub body: Option<String>,
}

async fn generate_with_timeout(
    model: &dyn AdvisorModel,
    system_prompt: Option<&str>,
    prompt: &str,
) -> Result<String, LlmError> {
    let timeout = std::time::Duration::from_secs(LLM_CALL_TIMEOUT_SECS);
    tokio::time::timeout(timeout, model.generate(system_prompt, prompt))
        .await
        .map_err(|_| LlmError::Timeout(LLM_CALL_TIMEOUT_SECS))?
}

/// Produce the advisor-facing and student-facing digests for one transcript.
///
/// # Errors
/// Propagates transport/timeout failures and empty responses: the caller
/// leaves the conversation unsummarized so the catch-up sweep retries it.
/// Non-empty but unparseable output degrades to a tagged fallback built from
/// the raw text, since the text itself is a usable summary.
pub async fn conversation_digest(
    model: &dyn AdvisorModel,
    transcript: &str,
    mode: &str,
) -> Result<Parsed<ConversationDigest>, LlmError> {
    let prompt = format!(
        r#"You are summarizing one college-admissions advising session (mode: {mode}).

Transcript:
{transcript}

Return JSON with these keys:
- "summary": advisor-facing prose digest, at most {CONVERSATION_SUMMARY_WORD_BUDGET} words, covering
  what was discussed, decided and promised
- "headline": one short student-facing line
- "topics": list of topics touched
- "decisions": list of decisions made
- "action_items": list of concrete follow-ups the student agreed to"#
    );

    let raw = generate_with_timeout(model, None, &prompt).await?;
    let cleaned = strip_markdown_fence(&raw);
    if cleaned.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    match serde_json::from_str::<DigestJson>(cleaned) {
        Ok(json) => Ok(Parsed::Value(ConversationDigest {
            advisor_summary: json.summary,
            user_summary: UserSummary {
                headline: json.headline.unwrap_or_else(|| "Advising session".to_owned()),
                topics: json.topics,
                decisions: json.decisions,
                action_items: json.action_items,
            },
        })),
        Err(e) => Ok(Parsed::Fallback {
            value: ConversationDigest {
                advisor_summary: truncate_chars(cleaned, 1500).to_owned(),
                user_summary: UserSummary {
                    headline: truncate_chars(cleaned.lines().next().unwrap_or(cleaned), 80)
                        .to_owned(),
                    ..UserSummary::default()
                },
            },
            reason: e.to_string(),
        }),
    }
}

/// The deterministic merge result used whenever the model cannot help:
/// prior understanding and commitments unchanged, a naive dated prefix line
/// for recent sessions, bounded by truncation.
fn fallback_fields(input: &MasterMergeInput<'_>) -> MasterFields {
    let dated_line = format!(
        "{}: {}",
        input.new_summary_date.format("%Y-%m-%d"),
        truncate_chars(input.new_summary, RECENT_SESSIONS_FALLBACK_CHARS)
    );
    let recent = if input.existing_recent_sessions.is_empty() {
        dated_line
    } else {
        format!("{dated_line}\n{}", input.existing_recent_sessions)
    };
    MasterFields {
        recent_sessions: truncate_chars(&recent, 1200).to_owned(),
        student_understanding: input.existing_understanding.to_owned(),
        open_commitments: input.existing_commitments.to_owned(),
    }
}

/// Fold a new conversation summary into the master-summary prose fields.
///
/// This is a summarize-of-summaries merge, not an append: the prompt asks
/// for updated, still-bounded fields, dropping resolved commitments and
/// stale session detail. Never fails; any model or parse failure yields the
/// tagged deterministic fallback.
pub async fn merge_master_fields(
    model: &dyn AdvisorModel,
    input: &MasterMergeInput<'_>,
) -> Parsed<MasterFields> {
    let priors = input
        .prior_summaries
        .iter()
        .map(|(at, summary)| format!("- {}: {}", at.format("%Y-%m-%d"), summary))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        r#"You maintain a student's long-term advising memory. Merge the newest session into it.

Current memory:
- recent_sessions: {recent}
- student_understanding: {understanding}
- open_commitments: {commitments}

Newest session ({date}):
{new_summary}

Earlier session summaries for continuity:
{priors}

Return JSON with keys "recent_sessions", "student_understanding" and
"open_commitments". Each value is prose of at most {MASTER_FIELD_WORD_BUDGET} words. Summarize,
do not concatenate: keep recent_sessions newest-first with dates, fold the
newest session into student_understanding, and drop commitments that are
resolved or stale."#,
        recent = input.existing_recent_sessions,
        understanding = input.existing_understanding,
        commitments = input.existing_commitments,
        date = input.new_summary_date.format("%Y-%m-%d"),
        new_summary = input.new_summary,
    );

    let raw = match generate_with_timeout(model, None, &prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            return Parsed::Fallback { value: fallback_fields(input), reason: e.to_string() };
        }
    };

    match parse_or_default::<MergeJson>(&raw, MergeJson::default()) {
        Parsed::Value(json) => Parsed::Value(MasterFields {
            recent_sessions: json
                .recent_sessions
                .unwrap_or_else(|| fallback_fields(input).recent_sessions),
            student_understanding: json
                .student_understanding
                .unwrap_or_else(|| input.existing_understanding.to_owned()),
            open_commitments: json
                .open_commitments
                .unwrap_or_else(|| input.existing_commitments.to_owned()),
        }),
        Parsed::Fallback { reason, .. } => {
            Parsed::Fallback { value: fallback_fields(input), reason }
        }
    }
}

/// Ask whether this student should be nudged. Degrades to "no notification"
/// on any failure: a missed nudge is cheaper than a wrong one.
pub async fn decide_notification(
    model: &dyn AdvisorModel,
    context_bundle: &str,
) -> Parsed<NotificationDecision> {
    let prompt = format!(
        r#"Decide whether this student should get a nudge notification today.

Student context:
{context_bundle}

Return JSON with keys "should_notify" (boolean), "title" and "body" (strings,
only when notifying). Notify only for a concrete, timely reason such as an
approaching deadline or an unfinished commitment."#
    );

    let no_notification =
        NotificationDecision { should_notify: false, title: None, body: None };

    let raw = match generate_with_timeout(model, None, &prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            return Parsed::Fallback { value: no_notification, reason: e.to_string() };
        }
    };

    match serde_json::from_str::<NotificationJson>(strip_markdown_fence(&raw)) {
        Ok(json) => Parsed::Value(NotificationDecision {
            should_notify: json.should_notify,
            title: json.title,
            body: json.body,
        }),
        Err(e) => Parsed::Fallback { value: no_notification, reason: e.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Model fake returning a fixed response (or error) for every call.
    struct ScriptedModel {
        response: Result<String, fn() -> LlmError>,
    }

    impl ScriptedModel {
        fn ok(response: &str) -> Self {
            Self { response: Ok(response.to_owned()) }
        }

        fn failing() -> Self {
            Self { response: Err(|| LlmError::EmptyResponse) }
        }
    }

    #[async_trait]
    impl AdvisorModel for ScriptedModel {
        async fn generate(
            &self,
            _system_prompt: Option<&str>,
            _prompt: &str,
        ) -> Result<String, LlmError> {
            match &self.response {
                Ok(s) => Ok(s.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn merge_input<'a>(new_summary: &'a str) -> MasterMergeInput<'a> {
        MasterMergeInput {
            existing_recent_sessions: "2026-07-01: talked scholarships.",
            existing_understanding: "Prefers small campuses.",
            existing_commitments: "Finish FAFSA by August.",
            new_summary,
            new_summary_date: "2026-08-05T12:00:00Z".parse().unwrap(),
            prior_summaries: &[],
        }
    }

    #[tokio::test]
    async fn digest_parses_clean_json() {
        let model = ScriptedModel::ok(
            r#"{"summary": "Discussed essay topics.", "headline": "Essay brainstorm",
                "topics": ["essays"], "decisions": [], "action_items": ["outline two drafts"]}"#,
        );
        let digest = conversation_digest(&model, "user: hi", "general").await.unwrap();
        assert!(!digest.is_fallback());
        let digest = digest.into_value();
        assert_eq!(digest.advisor_summary, "Discussed essay topics.");
        assert_eq!(digest.user_summary.headline, "Essay brainstorm");
        assert_eq!(digest.user_summary.action_items, vec!["outline two drafts"]);
    }

    #[tokio::test]
    async fn digest_falls_back_to_raw_prose() {
        let model = ScriptedModel::ok("We mostly talked about the SAT retake plan.");
        let digest = conversation_digest(&model, "user: hi", "general").await.unwrap();
        assert!(digest.is_fallback());
        let digest = digest.into_value();
        assert_eq!(digest.advisor_summary, "We mostly talked about the SAT retake plan.");
        assert!(digest.user_summary.topics.is_empty());
    }

    #[tokio::test]
    async fn digest_propagates_model_failure() {
        let model = ScriptedModel::failing();
        let result = conversation_digest(&model, "user: hi", "general").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn merge_takes_parsed_fields() {
        let model = ScriptedModel::ok(
            r#"{"recent_sessions": "2026-08-05: planned retake.",
                "student_understanding": "Confident now.",
                "open_commitments": "Register for October SAT."}"#,
        );
        let merged = merge_master_fields(&model, &merge_input("Planned retake.")).await;
        assert!(!merged.is_fallback());
        let fields = merged.into_value();
        assert_eq!(fields.student_understanding, "Confident now.");
        assert_eq!(fields.open_commitments, "Register for October SAT.");
    }

    #[tokio::test]
    async fn merge_keeps_prior_values_for_missing_keys() {
        let model = ScriptedModel::ok(r#"{"recent_sessions": "2026-08-05: planned retake."}"#);
        let fields = merge_master_fields(&model, &merge_input("Planned retake."))
            .await
            .into_value();
        assert_eq!(fields.student_understanding, "Prefers small campuses.");
        assert_eq!(fields.open_commitments, "Finish FAFSA by August.");
    }

    #[tokio::test]
    async fn merge_degrades_deterministically_on_model_failure() {
        let model = ScriptedModel::failing();
        let merged = merge_master_fields(&model, &merge_input("Planned the SAT retake.")).await;
        assert!(merged.is_fallback());
        let fields = merged.into_value();
        assert!(fields.recent_sessions.starts_with("2026-08-05: Planned the SAT retake."));
        assert!(fields.recent_sessions.contains("2026-07-01: talked scholarships."));
        assert_eq!(fields.student_understanding, "Prefers small campuses.");
        assert_eq!(fields.open_commitments, "Finish FAFSA by August.");
    }

    #[tokio::test]
    async fn merge_degrades_on_garbage_output() {
        let model = ScriptedModel::ok("I cannot help with that.");
        let merged = merge_master_fields(&model, &merge_input("Planned retake.")).await;
        assert!(merged.is_fallback());
    }

    #[tokio::test]
    async fn notification_decision_degrades_to_silence() {
        let model = ScriptedModel::failing();
        let decision = decide_notification(&model, "context").await;
        assert!(decision.is_fallback());
        assert!(!decision.into_value().should_notify);
    }

    #[tokio::test]
    async fn notification_decision_parses_positive() {
        let model = ScriptedModel::ok(
            r#"{"should_notify": true, "title": "FAFSA deadline", "body": "Due in 3 days."}"#,
        );
        let decision = decide_notification(&model, "context").await.into_value();
        assert!(decision.should_notify);
        assert_eq!(decision.title.as_deref(), Some("FAFSA deadline"));
    }
}
