//! Persistence for the Pathfinder advisor engine.
//!
//! Async domain traits over conversations, messages, master summaries and
//! profile data, with a SQLite implementation. The store is the consistency
//! boundary: single-row upserts are the unit of atomicity, no cross-row
//! transaction spans Conversation + StudentContext.

mod error;
mod migrations;
mod sqlite;
pub mod traits;

pub use error::StorageError;
pub use sqlite::Storage;
pub use traits::{
    AdvisorStore, ContextStore, ConversationStore, MasterUpdate, MessageStore, ProfileStore,
};

#[cfg(test)]
mod tests;
