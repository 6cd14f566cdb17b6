use async_trait::async_trait;

use crate::ai_types::{ChatMessage, ChatRequest, ResponseFormat};
use crate::client::LlmClient;
use crate::error::LlmError;

/// The single text-generation capability the engine consumes: prompt in,
/// text out. Non-deterministic; may return malformed output for structured
/// asks, so callers parse defensively.
#[async_trait]
pub trait AdvisorModel: Send + Sync {
    async fn generate(
        &self,
        system_prompt: Option<&str>,
        prompt: &str,
    ) -> Result<String, LlmError>;
}

#[async_trait]
impl AdvisorModel for LlmClient {
    async fn generate(
        &self,
        system_prompt: Option<&str>,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage { role: "system".to_owned(), content: system.to_owned() });
        }
        messages.push(ChatMessage { role: "user".to_owned(), content: prompt.to_owned() });

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            response_format: ResponseFormat::json_object(),
        };
        self.chat_completion(&request).await
    }
}
