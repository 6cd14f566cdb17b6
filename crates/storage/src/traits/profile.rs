use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pathfinder_core::{Deadline, Goal, StudentProfile};

use crate::error::StorageError;

/// Profile, goal and deadline data. Owned by the profile CRUD layer; the
/// engine reads it for assembly, and the upserts exist for that layer (and
/// tests) to write through. Any write path must also invalidate the context
/// cache.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, student_id: &str) -> Result<Option<StudentProfile>, StorageError>;

    async fn upsert_profile(&self, profile: &StudentProfile) -> Result<(), StorageError>;

    /// Goals in `planning` or `in_progress` status.
    async fn get_open_goals(&self, student_id: &str) -> Result<Vec<Goal>, StorageError>;

    async fn upsert_goal(&self, goal: &Goal) -> Result<(), StorageError>;

    /// Deadlines due at or after `after`, soonest first, capped at `limit`.
    async fn get_upcoming_deadlines(
        &self,
        student_id: &str,
        after: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Deadline>, StorageError>;

    async fn upsert_deadline(&self, deadline: &Deadline) -> Result<(), StorageError>;
}
