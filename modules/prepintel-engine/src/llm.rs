//! Chat-model seam. The engine only sees this trait; tests use scripted
//! fakes and production wires in the Claude client.

use anyhow::Result;
use async_trait::async_trait;

use prepintel_common::ChatMessage;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One completion over the given history. System turns in `messages` are
    /// ignored; the system prompt is passed separately.
    async fn complete(
        &self,
        system: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String>;
}

#[async_trait]
impl ChatModel for claude_client::ClaudeClient {
    async fn complete(
        &self,
        system: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let wire: Vec<claude_client::Message> = messages
            .iter()
            .filter_map(|m| match m.role.as_str() {
                "user" => Some(claude_client::Message::user(&m.content)),
                "assistant" => Some(claude_client::Message::assistant(&m.content)),
                _ => None,
            })
            .collect();

        self.chat(system, &wire, max_tokens, temperature).await
    }
}
