//! The Pathfinder conversation & context lifecycle engine.
//!
//! Decides when a chat session is "the same conversation" versus a new one,
//! assembles and caches the context fed to the advisor model, and compresses
//! finished conversations into a durable, bounded master summary in the
//! background, with a catch-up sweep for partial failures.
//!
//! This is a library invoked in-process by the request layer: no network or
//! CLI surface is owned here. Foreground operations surface errors;
//! fire-and-forget entry points (`spawn_warmup`, `enqueue`, the sweeper,
//! `mark_ended`) never let an internal error reach the end user.

mod assembler;
mod cache;
mod config;
mod error;
mod lifecycle;
mod notifier;
mod pipeline;
mod sweeper;

pub use assembler::ContextAssembler;
pub use cache::TtlCache;
pub use config::EngineConfig;
pub use error::EngineError;
pub use lifecycle::{ActiveConversation, ConversationLifecycle};
pub use notifier::{BatchOutcome, NotificationEngine, StudentNotification};
pub use pipeline::{SummarizationPipeline, SummarizeOutcome, SweepReport};
pub use sweeper::start_catchup_sweeper;
