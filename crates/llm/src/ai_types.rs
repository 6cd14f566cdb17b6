use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub(crate) fn json_object() -> Option<Self> {
        Some(Self { format_type: "json_object".to_owned() })
    }
}

#[derive(Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Deserialize)]
pub(crate) struct ResponseMessage {
    pub content: String,
}

/// Flat JSON contract for the per-conversation digest ask.
#[derive(Deserialize)]
pub(crate) struct DigestJson {
    pub summary: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
}

/// JSON contract for the master-summary merge ask. Optional fields: a key
/// the model omits keeps its prior value.
#[derive(Default, Deserialize)]
pub(crate) struct MergeJson {
    pub recent_sessions: Option<String>,
    pub student_understanding: Option<String>,
    pub open_commitments: Option<String>,
}

/// JSON contract for the notification decision ask.
#[derive(Deserialize)]
pub(crate) struct NotificationJson {
    pub should_notify: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}
