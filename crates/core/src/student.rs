use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// Profile fields read by context assembly. Owned and mutated by the profile
/// CRUD layer; read-only in this subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student_id: String,
    pub name: Option<String>,
    pub grade_level: Option<u8>,
    pub school: Option<String>,
    pub gpa: Option<f64>,
    pub sat_score: Option<u16>,
    pub act_score: Option<u8>,
    pub intended_major: Option<String>,
    #[serde(default)]
    pub target_schools: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Planning,
    InProgress,
    Completed,
}

impl GoalStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Planning => "planning",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for GoalStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(Self::Planning),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseEnumError::new("goal status", s)),
        }
    }
}

/// A student goal with its task completion counts. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub student_id: String,
    pub title: String,
    pub status: GoalStatus,
    pub total_tasks: u32,
    pub completed_tasks: u32,
}

/// An application deadline. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deadline {
    pub id: String,
    pub student_id: String,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub school: Option<String>,
}

/// Percent completion for a goal, `None` when the goal has no tasks.
///
/// A goal with zero tasks is "no data", not "no progress".
#[must_use]
pub fn goal_progress(completed_tasks: u32, total_tasks: u32) -> Option<u8> {
    if total_tasks == 0 {
        return None;
    }
    let pct = (f64::from(completed_tasks) * 100.0 / f64::from(total_tasks)).round();
    Some(pct.clamp(0.0, 100.0) as u8)
}

/// The master summary: one record per student, the durable compressed memory
/// of all past sessions.
///
/// Prose fields are kept within an approximate word budget by the merge
/// prompt, not by truncation; empty string means "nothing yet". Mutated only
/// by the summarization pipeline and by deterministic counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentContext {
    pub student_id: String,
    /// Short factual line (name, grade, school, scores, target schools).
    /// Deterministically derived; see [`quick_context`].
    pub quick_context: String,
    /// Bounded prose digest of the last few conversations, newest first.
    pub recent_sessions: String,
    /// Bounded prose: stable traits, concerns, preferences. Updated, not
    /// appended, each cycle.
    pub student_understanding: String,
    /// Bounded prose list of outstanding promises and deadlines; items are
    /// removed once resolved.
    pub open_commitments: String,
    #[serde(default)]
    pub generated_objectives: Vec<String>,
    #[serde(default)]
    pub upcoming_deadlines: Vec<String>,
    pub total_conversations: u32,
    pub total_messages: u64,
    pub last_conversation_at: Option<DateTime<Utc>>,
    pub master_summary_updated_at: Option<DateTime<Utc>>,
}

impl StudentContext {
    /// The lazily-created empty record for a student with no history.
    #[must_use]
    pub fn empty(student_id: &str) -> Self {
        Self {
            student_id: student_id.to_owned(),
            quick_context: String::new(),
            recent_sessions: String::new(),
            student_understanding: String::new(),
            open_commitments: String::new(),
            generated_objectives: Vec::new(),
            upcoming_deadlines: Vec::new(),
            total_conversations: 0,
            total_messages: 0,
            last_conversation_at: None,
            master_summary_updated_at: None,
        }
    }
}

/// Renders the quick-context line from current profile fields. No LLM: this
/// is a template, recomputed on every summarization cycle so profile edits
/// propagate.
#[must_use]
pub fn quick_context(profile: Option<&StudentProfile>) -> String {
    let Some(profile) = profile else {
        return "New student; profile not yet filled in.".to_owned();
    };

    let mut parts: Vec<String> = Vec::new();

    let name = profile.name.as_deref().unwrap_or("Student");
    match (profile.grade_level, profile.school.as_deref()) {
        (Some(grade), Some(school)) => parts.push(format!("{name}, grade {grade} at {school}")),
        (Some(grade), None) => parts.push(format!("{name}, grade {grade}")),
        (None, Some(school)) => parts.push(format!("{name} at {school}")),
        (None, None) => parts.push(name.to_owned()),
    }

    let mut academics: Vec<String> = Vec::new();
    if let Some(gpa) = profile.gpa {
        academics.push(format!("GPA {gpa:.2}"));
    }
    if let Some(sat) = profile.sat_score {
        academics.push(format!("SAT {sat}"));
    }
    if let Some(act) = profile.act_score {
        academics.push(format!("ACT {act}"));
    }
    if !academics.is_empty() {
        parts.push(academics.join(", "));
    }

    if let Some(major) = profile.intended_major.as_deref() {
        parts.push(format!("intends to study {major}"));
    }
    if !profile.target_schools.is_empty() {
        parts.push(format!("targeting {}", profile.target_schools.join(", ")));
    }

    format!("{}.", parts.join(". "))
}
