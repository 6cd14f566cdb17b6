use chrono::{Duration, Utc};
use pathfinder_core::UserSummary;

use super::{create_test_conversation, create_test_message, create_test_storage};
use crate::StorageError;
use crate::traits::{ConversationStore, MessageStore};

#[tokio::test]
async fn save_and_get_round_trip() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();
    let conversation = create_test_conversation("c1", "s1", now);

    storage.create_conversation(&conversation).await.unwrap();

    let retrieved = storage.get_conversation("c1").await.unwrap().unwrap();
    assert_eq!(retrieved.id, "c1");
    assert_eq!(retrieved.student_id, "s1");
    assert_eq!(retrieved.mode, "general");
    assert_eq!(retrieved.message_count, 0);
    assert!(retrieved.summary.is_none());
    assert!(retrieved.ended_at.is_none());
}

#[tokio::test]
async fn get_missing_returns_none() {
    let (storage, _temp_dir) = create_test_storage();
    assert!(storage.get_conversation("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn find_latest_open_skips_ended() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();

    let mut older = create_test_conversation("c-old", "s1", now - Duration::hours(2));
    older.last_message_at = Some(now - Duration::hours(2));
    storage.create_conversation(&older).await.unwrap();

    let mut newer = create_test_conversation("c-new", "s1", now);
    newer.last_message_at = Some(now);
    storage.create_conversation(&newer).await.unwrap();

    let found = storage.find_latest_open("s1").await.unwrap().unwrap();
    assert_eq!(found.id, "c-new");

    // Ending the newest makes the older one the latest open.
    assert!(storage.mark_ended("c-new", now).await.unwrap());
    let found = storage.find_latest_open("s1").await.unwrap().unwrap();
    assert_eq!(found.id, "c-old");
}

#[tokio::test]
async fn mark_ended_is_idempotent() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();
    storage.create_conversation(&create_test_conversation("c1", "s1", now)).await.unwrap();

    assert!(storage.mark_ended("c1", now).await.unwrap());
    assert!(!storage.mark_ended("c1", now + Duration::minutes(1)).await.unwrap());

    // The first ended_at wins.
    let retrieved = storage.get_conversation("c1").await.unwrap().unwrap();
    assert_eq!(retrieved.ended_at.unwrap().timestamp(), now.timestamp());
}

#[tokio::test]
async fn mark_ended_missing_row_is_benign() {
    let (storage, _temp_dir) = create_test_storage();
    assert!(!storage.mark_ended("ghost", Utc::now()).await.unwrap());
}

#[tokio::test]
async fn record_activity_increments_once_per_call() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();
    storage.create_conversation(&create_test_conversation("c1", "s1", now)).await.unwrap();

    let later = now + Duration::minutes(3);
    storage.record_activity("c1", now + Duration::minutes(1)).await.unwrap();
    storage.record_activity("c1", now + Duration::minutes(2)).await.unwrap();
    storage.record_activity("c1", later).await.unwrap();

    let retrieved = storage.get_conversation("c1").await.unwrap().unwrap();
    assert_eq!(retrieved.message_count, 3);
    assert_eq!(retrieved.last_message_at.unwrap().timestamp(), later.timestamp());
}

#[tokio::test]
async fn record_activity_missing_row_is_not_found() {
    let (storage, _temp_dir) = create_test_storage();
    let err = storage.record_activity("ghost", Utc::now()).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "conversation", .. }));
}

#[tokio::test]
async fn summary_write_is_guarded() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();
    storage.create_conversation(&create_test_conversation("c1", "s1", now)).await.unwrap();

    let digest = UserSummary {
        headline: "Talked about essays".to_owned(),
        topics: vec!["essays".to_owned()],
        decisions: vec![],
        action_items: vec!["Draft the common app essay".to_owned()],
    };
    assert!(storage.set_summary_if_absent("c1", "first summary", &digest, now).await.unwrap());
    assert!(
        !storage
            .set_summary_if_absent("c1", "second summary", &digest, now)
            .await
            .unwrap()
    );

    let retrieved = storage.get_conversation("c1").await.unwrap().unwrap();
    assert_eq!(retrieved.summary.as_deref(), Some("first summary"));
    let user = retrieved.summary_for_user.unwrap();
    assert_eq!(user.headline, "Talked about essays");
    assert_eq!(user.action_items.len(), 1);
}

#[tokio::test]
async fn candidates_exclude_summarized_and_empty() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();
    let cutoff = now - Duration::hours(4);

    // Old, has messages, unsummarized: a candidate.
    let old = create_test_conversation("c-old", "s1", now - Duration::hours(6));
    storage.create_conversation(&old).await.unwrap();
    storage
        .append_message(&create_test_message("m1", "c-old", pathfinder_core::MessageRole::User))
        .await
        .unwrap();
    storage.record_activity("c-old", now - Duration::hours(6)).await.unwrap();

    // Old but zero messages: never a candidate.
    storage
        .create_conversation(&create_test_conversation("c-empty", "s1", now - Duration::hours(8)))
        .await
        .unwrap();

    // Old with messages but already summarized: never a candidate.
    let done = create_test_conversation("c-done", "s2", now - Duration::hours(7));
    storage.create_conversation(&done).await.unwrap();
    storage.record_activity("c-done", now - Duration::hours(7)).await.unwrap();
    storage
        .set_summary_if_absent("c-done", "done", &UserSummary::default(), now)
        .await
        .unwrap();

    // Fresh and unended: not a candidate while inside the window.
    let fresh = create_test_conversation("c-fresh", "s3", now);
    storage.create_conversation(&fresh).await.unwrap();
    storage.record_activity("c-fresh", now).await.unwrap();

    let candidates = storage.summarization_candidates(cutoff, 10).await.unwrap();
    let ids: Vec<&str> = candidates.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["c-old"]);

    // Explicitly ending the fresh conversation makes it eligible immediately.
    storage.mark_ended("c-fresh", now).await.unwrap();
    let candidates = storage.summarization_candidates(cutoff, 10).await.unwrap();
    let ids: Vec<&str> = candidates.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["c-old", "c-fresh"]);
}

#[tokio::test]
async fn candidates_are_oldest_first_and_capped() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();
    let cutoff = now - Duration::hours(4);

    for (id, hours_ago) in [("c-a", 10i64), ("c-b", 20), ("c-c", 5)] {
        let at = now - Duration::hours(hours_ago);
        let conversation = create_test_conversation(id, "s1", at);
        storage.create_conversation(&conversation).await.unwrap();
        storage.record_activity(id, at).await.unwrap();
    }

    let candidates = storage.summarization_candidates(cutoff, 2).await.unwrap();
    let ids: Vec<&str> = candidates.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["c-b", "c-a"]);
}

#[tokio::test]
async fn stale_for_student_is_scoped() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();
    let cutoff = now - Duration::hours(4);

    for (id, student) in [("c-s1", "s1"), ("c-s2", "s2")] {
        let at = now - Duration::hours(6);
        storage.create_conversation(&create_test_conversation(id, student, at)).await.unwrap();
        storage.record_activity(id, at).await.unwrap();
    }

    let stale = storage.stale_unsummarized_for_student("s1", cutoff).await.unwrap();
    assert_eq!(stale, vec!["c-s1".to_owned()]);
}

#[tokio::test]
async fn prior_summaries_newest_first_excluding_current() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();

    for (id, hours_ago, summary) in
        [("c-1", 30i64, "first"), ("c-2", 20, "second"), ("c-3", 10, "third")]
    {
        let at = now - Duration::hours(hours_ago);
        storage.create_conversation(&create_test_conversation(id, "s1", at)).await.unwrap();
        storage.record_activity(id, at).await.unwrap();
        storage.set_summary_if_absent(id, summary, &UserSummary::default(), at).await.unwrap();
    }

    let priors = storage.prior_summaries("s1", "c-3", 2).await.unwrap();
    let texts: Vec<&str> = priors.iter().map(|(_, s)| s.as_str()).collect();
    assert_eq!(texts, vec!["second", "first"]);
}
