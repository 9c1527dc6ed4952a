mod types;

pub use types::{Message, Role};

use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use types::{ChatRequest, ChatResponse};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http: reqwest::Client::new(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Send one Messages API call and return the concatenated text output.
    /// An empty completion is treated as an error so callers can fall back.
    pub async fn chat(
        &self,
        system: &str,
        messages: &[Message],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            max_tokens,
            messages,
            system: (!system.is_empty()).then_some(system),
            temperature: Some(temperature),
        };

        debug!(model = %self.model, messages = messages.len(), "Claude chat request");

        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Claude API error ({}): {}", status, error_text));
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed.text();
        if text.is_empty() {
            return Err(anyhow!("Claude returned no text content"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::types::ChatResponse;

    #[test]
    fn response_text_joins_text_blocks_and_skips_others() {
        let body = r#"{
            "content": [
                {"type": "text", "text": "Hello "},
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "world"}
            ],
            "stop_reason": "end_turn"
        }"#;

        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.text(), "Hello world");
    }

    #[test]
    fn empty_content_yields_empty_text() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert_eq!(parsed.text(), "");
    }
}
