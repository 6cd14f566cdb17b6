use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// One advising session.
///
/// A conversation is never flagged "active" in the store; activity is a
/// property of its timestamps, evaluated by [`is_active`]. The `summary*`
/// fields are write-once: a populated `summary` must never be overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub student_id: String,
    /// Free-form session intent tag, e.g. "general", "planning".
    pub mode: String,
    pub started_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
    /// Explicit termination. Once set, the conversation can never be
    /// selected as active again.
    pub ended_at: Option<DateTime<Utc>>,
    pub message_count: u32,
    /// Advisor-facing prose digest, written once by summarization.
    pub summary: Option<String>,
    /// Student-facing structured digest, written alongside `summary`.
    pub summary_for_user: Option<UserSummary>,
    pub summary_updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// A fresh conversation as created on the first message of a new session.
    #[must_use]
    pub fn new(id: String, student_id: String, mode: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            student_id,
            mode,
            started_at: now,
            last_message_at: Some(now),
            ended_at: None,
            message_count: 0,
            summary: None,
            summary_for_user: None,
            summary_updated_at: None,
        }
    }

    /// The instant the activity window is measured from. Rows predating the
    /// first message fall back to `started_at`.
    #[must_use]
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_message_at.unwrap_or(self.started_at)
    }
}

/// Whether `conversation` still counts as the same session at `now`.
///
/// True iff it was never explicitly ended and its last activity is within
/// `window` of `now`. The window edge is inclusive: a conversation whose last
/// message landed exactly `window` ago is still active.
#[must_use]
pub fn is_active(conversation: &Conversation, now: DateTime<Utc>, window: Duration) -> bool {
    conversation.ended_at.is_none() && conversation.last_activity_at() >= now - window
}

/// Student-facing structured digest of a finished conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSummary {
    pub headline: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(ParseEnumError::new("message role", s)),
        }
    }
}

/// One chat message. Immutable once created; belongs to exactly one
/// conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    /// Parsed-intent / widget metadata attached by the chat route, opaque to
    /// this subsystem.
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Renders a transcript for summarization, capped at `char_budget` so an
/// oversized conversation cannot blow the prompt budget. Keeps the most
/// recent messages when truncating.
#[must_use]
pub fn render_transcript(messages: &[Message], char_budget: usize) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(messages.len());
    let mut total = 0usize;
    for msg in messages.iter().rev() {
        let line = format!("{}: {}", msg.role.as_str(), msg.content.trim());
        total += line.len() + 1;
        if total > char_budget && !lines.is_empty() {
            lines.push("[earlier messages omitted]".to_owned());
            break;
        }
        lines.push(line);
    }
    lines.reverse();
    lines.join("\n")
}
