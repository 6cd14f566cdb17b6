//! Test utilities and module declarations for storage tests.

use chrono::{DateTime, Utc};
use pathfinder_core::{Conversation, Message, MessageRole};
use tempfile::TempDir;

use crate::Storage;

pub fn create_test_storage() -> (Storage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = Storage::new(&db_path).unwrap();
    (storage, temp_dir)
}

pub fn create_test_conversation(id: &str, student_id: &str, now: DateTime<Utc>) -> Conversation {
    Conversation::new(id.to_owned(), student_id.to_owned(), "general".to_owned(), now)
}

pub fn create_test_message(id: &str, conversation_id: &str, role: MessageRole) -> Message {
    Message {
        id: id.to_owned(),
        conversation_id: conversation_id.to_owned(),
        role,
        content: format!("content of {id}"),
        metadata: None,
        created_at: Utc::now(),
    }
}

mod context_tests;
mod conversation_tests;
mod message_tests;
