use pathfinder_llm::LlmError;
use pathfinder_storage::StorageError;
use thiserror::Error;

/// Engine-level error: everything a foreground caller can see.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}
