use chrono::{Duration, Utc};
use pathfinder_core::{Message, MessageRole};

use super::{create_test_conversation, create_test_storage};
use crate::traits::{ConversationStore, MessageStore};

#[tokio::test]
async fn messages_come_back_in_creation_order() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();
    storage.create_conversation(&create_test_conversation("c1", "s1", now)).await.unwrap();

    for (i, role) in [MessageRole::User, MessageRole::Assistant, MessageRole::User]
        .into_iter()
        .enumerate()
    {
        let message = Message {
            id: format!("m{i}"),
            conversation_id: "c1".to_owned(),
            role,
            content: format!("turn {i}"),
            metadata: None,
            created_at: now + Duration::seconds(i as i64),
        };
        storage.append_message(&message).await.unwrap();
    }

    let messages = storage.get_messages("c1").await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["turn 0", "turn 1", "turn 2"]);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[1].role, MessageRole::Assistant);
}

#[tokio::test]
async fn metadata_round_trips_as_json() {
    let (storage, _temp_dir) = create_test_storage();
    let now = Utc::now();
    storage.create_conversation(&create_test_conversation("c1", "s1", now)).await.unwrap();

    let message = Message {
        id: "m1".to_owned(),
        conversation_id: "c1".to_owned(),
        role: MessageRole::Assistant,
        content: "Here are some schools to consider.".to_owned(),
        metadata: Some(serde_json::json!({"widget": "school_list", "count": 3})),
        created_at: now,
    };
    storage.append_message(&message).await.unwrap();

    let messages = storage.get_messages("c1").await.unwrap();
    let metadata = messages[0].metadata.as_ref().unwrap();
    assert_eq!(metadata["widget"], "school_list");
    assert_eq!(metadata["count"], 3);
}
