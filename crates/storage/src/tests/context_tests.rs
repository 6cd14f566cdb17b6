use chrono::{Duration, Utc};

use super::create_test_storage;
use crate::traits::{ContextStore, MasterUpdate};

#[tokio::test]
async fn context_is_created_lazily_on_first_conversation() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();

    assert!(storage.get_student_context("s1").await.unwrap().is_none());

    storage.record_conversation_started("s1", now).await.unwrap();
    let context = storage.get_student_context("s1").await.unwrap().unwrap();
    assert_eq!(context.total_conversations, 1);
    assert_eq!(context.total_messages, 0);
    assert_eq!(context.last_conversation_at.unwrap().timestamp(), now.timestamp());
    assert!(context.quick_context.is_empty());
}

#[tokio::test]
async fn conversation_counter_increments() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();

    storage.record_conversation_started("s1", now).await.unwrap();
    storage.record_conversation_started("s1", now + Duration::hours(5)).await.unwrap();

    let context = storage.get_student_context("s1").await.unwrap().unwrap();
    assert_eq!(context.total_conversations, 2);
}

#[tokio::test]
async fn master_update_replaces_prose_and_adds_messages() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();
    storage.record_conversation_started("s1", now).await.unwrap();

    let update = MasterUpdate {
        student_id: "s1".to_owned(),
        quick_context: "Maya, grade 11.".to_owned(),
        recent_sessions: "Today: discussed essays.".to_owned(),
        student_understanding: "Anxious about deadlines.".to_owned(),
        open_commitments: "Draft essay by Friday.".to_owned(),
        messages_delta: 6,
        updated_at: now,
    };
    storage.apply_master_update(&update).await.unwrap();

    let second = MasterUpdate {
        recent_sessions: "Later: narrowed school list. Today: discussed essays.".to_owned(),
        messages_delta: 4,
        ..update
    };
    storage.apply_master_update(&second).await.unwrap();

    let context = storage.get_student_context("s1").await.unwrap().unwrap();
    assert_eq!(context.recent_sessions, "Later: narrowed school list. Today: discussed essays.");
    assert_eq!(context.total_messages, 10);
    assert_eq!(context.total_conversations, 1);
    assert!(context.master_summary_updated_at.is_some());
}

#[tokio::test]
async fn master_update_upserts_missing_record() {
    let (storage, _temp_dir) = create_test_storage();
    let update = MasterUpdate {
        student_id: "s-new".to_owned(),
        quick_context: "New student.".to_owned(),
        recent_sessions: String::new(),
        student_understanding: String::new(),
        open_commitments: String::new(),
        messages_delta: 2,
        updated_at: Utc::now(),
    };
    storage.apply_master_update(&update).await.unwrap();

    let context = storage.get_student_context("s-new").await.unwrap().unwrap();
    assert_eq!(context.total_messages, 2);
    assert_eq!(context.quick_context, "New student.");
}

#[tokio::test]
async fn recently_active_students_respects_horizon() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();

    storage.record_conversation_started("s-recent", now - Duration::days(2)).await.unwrap();
    storage.record_conversation_started("s-stale", now - Duration::days(40)).await.unwrap();

    let active =
        storage.recently_active_students(now - Duration::days(14), 10).await.unwrap();
    assert_eq!(active, vec!["s-recent".to_owned()]);
}
