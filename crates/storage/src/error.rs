//! Typed error enum for the storage layer.
//!
//! Callers match on specific failure modes (not found vs. transient database
//! failure) instead of downcasting opaque boxes: best-effort operations treat
//! `NotFound` as benign, foreground operations surface it.

use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Row not found for an expected-present entity.
    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// SQL / connection failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Row data could not be deserialized into a domain type.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The connection mutex was poisoned by a panicking writer.
    #[error("storage lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StorageError {
    /// Whether a missing-row error, for best-effort callers.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataCorruption {
            context: "JSON column serialization".to_owned(),
            source: Box::new(err),
        }
    }
}
