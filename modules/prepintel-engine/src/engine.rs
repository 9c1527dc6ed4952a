//! Turn-level routing: classify the query, decide between a general chat
//! reply and an interview-intel brief, and carry cached sources forward so a
//! follow-up about the same interview never re-runs retrieval.

use std::sync::Arc;

use tracing::info;

use prepintel_common::{ChatMessage, PrepIntelError};
use prepintel_retrieval::SourceAggregator;

use crate::intent::{Intent, IntentClassifier};
use crate::llm::ChatModel;
use crate::state::{split_agent_state, state_message, AgentState};
use crate::synthesis::{AnswerSynthesizer, SourceRef};

const MAX_SOURCES: usize = 3;
const GENERAL_MAX_TOKENS: u32 = 500;
const GENERAL_FALLBACK: &str = "I'm here! How can I help you?";

const GENERAL_SYSTEM_PROMPT: &str = "\
You are PrepIntel, a friendly and concise interview-prep assistant. Answer \
the user's question directly. If they mention an upcoming interview at a \
specific company, invite them to share the company and role so you can pull \
together fresh intel for them.";

/// Questions that ask for a definition or comparison are answered directly
/// even when cached interview context exists, unless the question itself is
/// about an interview.
const CONCEPT_PREFIXES: &[&str] = &[
    "what is ",
    "what are ",
    "explain ",
    "define ",
    "how does ",
    "how do ",
    "describe ",
    "difference between ",
    "compare ",
    "when is ",
    "why is ",
];

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub intent: Intent,
    pub answer: String,
    pub sources: Vec<SourceRef>,
    /// Full message list to send back on the next turn, state blob included.
    pub messages: Vec<ChatMessage>,
}

pub struct Engine {
    classifier: IntentClassifier,
    synthesizer: AnswerSynthesizer,
    general_model: Arc<dyn ChatModel>,
    aggregator: SourceAggregator,
}

impl Engine {
    pub fn new(
        intent_model: Arc<dyn ChatModel>,
        analysis_model: Arc<dyn ChatModel>,
        aggregator: SourceAggregator,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(intent_model.clone()),
            synthesizer: AnswerSynthesizer::new(analysis_model),
            general_model: intent_model,
            aggregator,
        }
    }

    pub async fn handle(
        &self,
        query: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatTurn, PrepIntelError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PrepIntelError::InvalidRequest("query must not be empty".into()));
        }

        let (history, state) = split_agent_state(messages);
        let mut intent = self.classifier.extract(query, &history).await;

        if is_concept_question(query) {
            intent.wants_interview_intel = false;
        }

        if intent.wants_interview_intel {
            self.interview_turn(query, intent, history, state).await
        } else {
            self.general_turn(query, intent, history, state).await
        }
    }

    async fn interview_turn(
        &self,
        query: &str,
        mut intent: Intent,
        history: Vec<ChatMessage>,
        state: AgentState,
    ) -> Result<ChatTurn, PrepIntelError> {
        // A follow-up often omits the company or role; fall back to what the
        // conversation already established.
        if intent.company.is_empty() {
            intent.company = state.company.clone();
        }
        if intent.role.is_empty() {
            intent.role = state.role.clone();
        }

        let refresh = state.sources.is_empty()
            || intent.company != state.company
            || intent.role != state.role;

        let sources = if refresh {
            info!(company = %intent.company, role = %intent.role, "Refreshing interview sources");
            self.aggregator
                .fetch_interview_sources(&intent.company, &intent.role, MAX_SOURCES)
                .await
        } else {
            info!(company = %intent.company, cached = state.sources.len(), "Reusing cached sources");
            state.sources.clone()
        };

        let (answer, refs) = self
            .synthesizer
            .synthesize(query, &intent, &sources, &history)
            .await;

        let next_state = AgentState {
            company: intent.company.clone(),
            role: intent.role.clone(),
            sources,
        };
        let messages = next_messages(history, query, &answer, &next_state);

        Ok(ChatTurn { intent, answer, sources: refs, messages })
    }

    async fn general_turn(
        &self,
        query: &str,
        intent: Intent,
        history: Vec<ChatMessage>,
        state: AgentState,
    ) -> Result<ChatTurn, PrepIntelError> {
        let mut prompt_messages = history.clone();
        prompt_messages.push(ChatMessage::user(query));

        let answer = match self
            .general_model
            .complete(GENERAL_SYSTEM_PROMPT, &prompt_messages, GENERAL_MAX_TOKENS, 0.5)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                info!(error = %e, "General reply failed; using canned fallback");
                GENERAL_FALLBACK.to_string()
            }
        };

        // Cached interview context survives general chit-chat untouched.
        let messages = next_messages(history, query, &answer, &state);

        Ok(ChatTurn { intent, answer, sources: Vec::new(), messages })
    }
}

fn next_messages(
    mut history: Vec<ChatMessage>,
    query: &str,
    answer: &str,
    state: &AgentState,
) -> Vec<ChatMessage> {
    history.push(ChatMessage::user(query));
    history.push(ChatMessage::assistant(answer));
    if !state.is_empty() {
        history.push(state_message(state));
    }
    history
}

fn is_concept_question(query: &str) -> bool {
    let lowered = query.to_lowercase();
    if lowered.contains("interview") || lowered.contains("round") {
        return false;
    }
    CONCEPT_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix))
}
