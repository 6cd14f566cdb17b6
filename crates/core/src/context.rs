use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the chat route needs to open an advisor turn: the rendered
/// system prompt plus the structured sidebar payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledContext {
    pub student_id: String,
    /// The session mode this context was rendered for.
    pub mode: String,
    pub system_prompt: String,
    pub sidebar: SidebarPayload,
    pub assembled_at: DateTime<Utc>,
}

/// Structured payload rendered next to the chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SidebarPayload {
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub deadlines: Vec<SidebarDeadline>,
    /// Open commitments from the master summary, prose.
    pub commitments: String,
    #[serde(default)]
    pub goal_progress: Vec<GoalProgress>,
    pub days_since_last_session: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidebarDeadline {
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub school: Option<String>,
}

/// Per-goal completion for the sidebar. `progress` is `None` for goals with
/// no tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal_id: String,
    pub title: String,
    pub progress: Option<u8>,
}

/// Lightweight profile snapshot used by greeting generation; cached on a
/// shorter TTL than full assembled context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub student_id: String,
    pub display_name: Option<String>,
    pub grade_level: Option<u8>,
    pub school: Option<String>,
    pub total_conversations: u32,
    pub last_conversation_at: Option<DateTime<Utc>>,
}
