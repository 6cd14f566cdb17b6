//! Shared constants for the advisor engine.
//!
//! Centralizes the tunables that would otherwise be duplicated across crates.

/// Hours after the last message during which a conversation is still
/// resumable. Too short fragments one real session into several rows; too
/// long treats a next-day return as a continuation.
pub const DEFAULT_ACTIVE_WINDOW_HOURS: i64 = 4;

/// TTL for cached assembled advisor context, in seconds.
pub const CONTEXT_CACHE_TTL_SECS: u64 = 600;

/// TTL for the lighter profile-snapshot cache used by greeting generation.
pub const PROFILE_CACHE_TTL_SECS: u64 = 300;

/// Approximate word budget for each prose field of the master summary.
/// Enforced by the generation prompt, not by truncation.
pub const MASTER_FIELD_WORD_BUDGET: usize = 150;

/// Approximate word budget for the advisor-facing conversation summary.
pub const CONVERSATION_SUMMARY_WORD_BUDGET: usize = 200;

/// Prior conversation summaries carried into the master-summary merge for
/// continuity.
pub const PRIOR_SUMMARIES_FOR_MERGE: usize = 3;

/// Hard character cap on a rendered transcript fed to the model.
pub const TRANSCRIPT_CHAR_BUDGET: usize = 24_000;

/// Characters of the new summary used by the deterministic recent-sessions
/// fallback when the merge call fails.
pub const RECENT_SESSIONS_FALLBACK_CHARS: usize = 200;

/// Default batch size for the catch-up summarization sweep.
pub const DEFAULT_SWEEP_LIMIT: usize = 20;

/// Default interval between catch-up sweeps, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Caller-enforced timeout on a single LLM generation call, in seconds.
pub const LLM_CALL_TIMEOUT_SECS: u64 = 45;

/// Upcoming deadlines included in assembled context.
pub const UPCOMING_DEADLINES_LIMIT: usize = 5;

/// Recent-student horizon for the notification batch, in days.
pub const NOTIFICATION_HORIZON_DAYS: i64 = 14;
