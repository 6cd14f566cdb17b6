//! Context assembly: everything the advisor model is told about a student,
//! plus the read-through cache in front of it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pathfinder_core::constants::UPCOMING_DEADLINES_LIMIT;
use pathfinder_core::{
    AssembledContext, GoalProgress, Message, ProfileSnapshot, SidebarDeadline, SidebarPayload,
    StudentContext, goal_progress, quick_context, render_transcript,
};
use pathfinder_storage::{AdvisorStore, ContextStore, ProfileStore};

use crate::cache::TtlCache;
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Builds advisor context from the store and caches it per student.
///
/// Assembly itself is a pure read; only the cache entry points mutate the
/// (process-local) cache. Every profile-mutating write path must call
/// [`ContextAssembler::invalidate`]; within the TTL window staleness is the
/// accepted tradeoff.
pub struct ContextAssembler {
    storage: Arc<dyn AdvisorStore>,
    context_cache: TtlCache<AssembledContext>,
    profile_cache: TtlCache<ProfileSnapshot>,
}

impl ContextAssembler {
    #[must_use]
    pub fn new(storage: Arc<dyn AdvisorStore>, config: &EngineConfig) -> Self {
        Self {
            storage,
            context_cache: TtlCache::new(config.context_cache_ttl),
            profile_cache: TtlCache::new(config.profile_cache_ttl),
        }
    }

    /// Assemble the full advisor context from stored state. Tolerates every
    /// optional field being absent: a brand-new student gets a minimal but
    /// valid context.
    pub async fn assemble(
        &self,
        student_id: &str,
        mode: &str,
        recent_messages: &[Message],
        now: DateTime<Utc>,
    ) -> Result<AssembledContext, EngineError> {
        let profile = self.storage.get_profile(student_id).await?;
        let context = self
            .storage
            .get_student_context(student_id)
            .await?
            .unwrap_or_else(|| StudentContext::empty(student_id));
        let goals = self.storage.get_open_goals(student_id).await?;
        let deadlines = self
            .storage
            .get_upcoming_deadlines(student_id, now, UPCOMING_DEADLINES_LIMIT)
            .await?;

        let goal_rows: Vec<GoalProgress> = goals
            .iter()
            .map(|g| GoalProgress {
                goal_id: g.id.clone(),
                title: g.title.clone(),
                progress: goal_progress(g.completed_tasks, g.total_tasks),
            })
            .collect();

        let student_line = if context.quick_context.is_empty() {
            quick_context(profile.as_ref())
        } else {
            context.quick_context.clone()
        };

        let days_since_last_session =
            context.last_conversation_at.map(|at| (now - at).num_days());

        let system_prompt = render_system_prompt(
            mode,
            &student_line,
            &context,
            &goal_rows,
            &deadlines,
            recent_messages,
        );

        let sidebar = SidebarPayload {
            objectives: context.generated_objectives.clone(),
            deadlines: deadlines
                .iter()
                .map(|d| SidebarDeadline {
                    title: d.title.clone(),
                    due_date: d.due_date,
                    school: d.school.clone(),
                })
                .collect(),
            commitments: context.open_commitments.clone(),
            goal_progress: goal_rows,
            days_since_last_session,
        };

        Ok(AssembledContext {
            student_id: student_id.to_owned(),
            mode: mode.to_owned(),
            system_prompt,
            sidebar,
            assembled_at: now,
        })
    }

    /// Cached context for the chat endpoint: cache hit or assemble-and-store.
    pub async fn get_or_assemble(
        &self,
        student_id: &str,
        mode: &str,
    ) -> Result<AssembledContext, EngineError> {
        if let Some(cached) = self.context_cache.get(student_id) {
            return Ok(cached);
        }
        let assembled = self.assemble(student_id, mode, &[], Utc::now()).await?;
        self.context_cache.set(student_id, assembled.clone());
        Ok(assembled)
    }

    /// Populate the cache ahead of the first chat turn. No-op on a fresh
    /// cache hit.
    pub async fn warmup(&self, student_id: &str, mode: &str) -> Result<(), EngineError> {
        if self.context_cache.get(student_id).is_some() {
            return Ok(());
        }
        let assembled = self.assemble(student_id, mode, &[], Utc::now()).await?;
        self.context_cache.set(student_id, assembled);
        Ok(())
    }

    /// Fire-and-forget warmup, spawned right after authentication so cache
    /// population overlaps the landing page. Never surfaces an error.
    /// Consumes an `Arc` handle so the spawned task shares this cache.
    pub fn spawn_warmup(
        self: Arc<Self>,
        student_id: String,
        mode: String,
    ) -> tokio::task::JoinHandle<()> {
        let this = self;
        tokio::spawn(async move {
            if let Err(e) = this.warmup(&student_id, &mode).await {
                tracing::warn!(student_id, error = %e, "context warmup failed");
            }
        })
    }

    /// Drop cached state for a student. Called by every write path that
    /// mutates the profile data feeding assembly.
    pub fn invalidate(&self, student_id: &str) {
        self.context_cache.invalidate(student_id);
        self.profile_cache.invalidate(student_id);
    }

    /// Lightweight snapshot for greeting generation, cached on its own
    /// shorter TTL.
    pub async fn profile_snapshot(
        &self,
        student_id: &str,
    ) -> Result<ProfileSnapshot, EngineError> {
        if let Some(cached) = self.profile_cache.get(student_id) {
            return Ok(cached);
        }
        let profile = self.storage.get_profile(student_id).await?;
        let context = self.storage.get_student_context(student_id).await?;
        let snapshot = ProfileSnapshot {
            student_id: student_id.to_owned(),
            display_name: profile.as_ref().and_then(|p| p.name.clone()),
            grade_level: profile.as_ref().and_then(|p| p.grade_level),
            school: profile.as_ref().and_then(|p| p.school.clone()),
            total_conversations: context.as_ref().map_or(0, |c| c.total_conversations),
            last_conversation_at: context.as_ref().and_then(|c| c.last_conversation_at),
        };
        self.profile_cache.set(student_id, snapshot.clone());
        Ok(snapshot)
    }
}

fn render_system_prompt(
    mode: &str,
    student_line: &str,
    context: &StudentContext,
    goals: &[GoalProgress],
    deadlines: &[pathfinder_core::Deadline],
    recent_messages: &[Message],
) -> String {
    let mut sections: Vec<String> = Vec::new();

    sections.push(format!(
        "You are Pathfinder's college-admissions advisor. Session mode: {mode}.\n\n\
         ## Student\n{student_line}"
    ));

    if !context.student_understanding.is_empty() {
        sections.push(format!("## What we know\n{}", context.student_understanding));
    }
    if !context.recent_sessions.is_empty() {
        sections.push(format!("## Recent sessions\n{}", context.recent_sessions));
    }
    if !context.open_commitments.is_empty() {
        sections.push(format!("## Open commitments\n{}", context.open_commitments));
    }
    if !context.generated_objectives.is_empty() {
        sections.push(format!(
            "## Current objectives\n{}",
            context
                .generated_objectives
                .iter()
                .map(|o| format!("- {o}"))
                .collect::<Vec<_>>()
                .join("\n")
        ));
    }

    if !goals.is_empty() {
        let lines: Vec<String> = goals
            .iter()
            .map(|g| match g.progress {
                Some(pct) => format!("- {} ({pct}% complete)", g.title),
                None => format!("- {} (no tasks yet)", g.title),
            })
            .collect();
        sections.push(format!("## Goals\n{}", lines.join("\n")));
    }

    if !deadlines.is_empty() {
        let lines: Vec<String> = deadlines
            .iter()
            .map(|d| {
                let school = d.school.as_deref().map(|s| format!(" ({s})")).unwrap_or_default();
                format!("- {}: {}{school}", d.due_date.format("%Y-%m-%d"), d.title)
            })
            .collect();
        sections.push(format!("## Upcoming deadlines\n{}", lines.join("\n")));
    }

    if !recent_messages.is_empty() {
        sections.push(format!(
            "## Conversation so far\n{}",
            render_transcript(recent_messages, 4000)
        ));
    }

    sections.push(
        "Ground every recommendation in the context above. Be concrete and encouraging, \
         and keep track of what the student has already committed to."
            .to_owned(),
    );

    sections.join("\n\n")
}
