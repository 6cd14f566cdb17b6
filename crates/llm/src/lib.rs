//! LLM integration for the Pathfinder advisor engine.
//!
//! [`LlmClient`] talks to an OpenAI-compatible chat-completions endpoint with
//! bounded retry; [`AdvisorModel`] is the single "generate text from a prompt"
//! capability the engine depends on. The digest module layers the domain
//! generation calls on top, each with a caller-enforced timeout and a
//! deterministic fallback path.

mod ai_types;
mod client;
mod digest;
mod error;
mod model;

pub use client::{LlmClient, truncate_chars};
pub use digest::{
    ConversationDigest, MasterFields, MasterMergeInput, NotificationDecision,
    conversation_digest, decide_notification, merge_master_fields,
};
pub use error::LlmError;
pub use model::AdvisorModel;
