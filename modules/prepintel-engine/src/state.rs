//! Cached conversation state smuggled through the message list as a prefixed
//! system message, so stateless callers can round-trip company, role, and
//! previously fetched sources without a database.

use serde::{Deserialize, Serialize};
use tracing::warn;

use prepintel_common::ChatMessage;
use prepintel_retrieval::EnrichedSource;

pub const STATE_PREFIX: &str = "__agent_state__:";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub sources: Vec<EnrichedSource>,
}

impl AgentState {
    pub fn is_empty(&self) -> bool {
        self.company.is_empty() && self.role.is_empty() && self.sources.is_empty()
    }
}

/// Split incoming messages into plain conversation history and the most
/// recent parseable state blob. Malformed blobs are dropped, not surfaced.
pub fn split_agent_state(messages: &[ChatMessage]) -> (Vec<ChatMessage>, AgentState) {
    let mut history = Vec::with_capacity(messages.len());
    let mut state = AgentState::default();

    for message in messages {
        match message.content.strip_prefix(STATE_PREFIX) {
            Some(payload) => match serde_json::from_str::<AgentState>(payload) {
                Ok(parsed) => state = parsed,
                Err(e) => warn!(error = %e, "Dropping malformed agent state blob"),
            },
            None => history.push(message.clone()),
        }
    }

    (history, state)
}

/// Serialize state into the carrier message appended after each answer.
pub fn state_message(state: &AgentState) -> ChatMessage {
    let payload = serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string());
    ChatMessage::system(format!("{STATE_PREFIX}{payload}"))
}
