//! Builds the grounded coaching prompt from enriched sources and asks the
//! analysis model for the final brief.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use prepintel_common::{clamp_chars, clean_text, ChatMessage};
use prepintel_retrieval::EnrichedSource;

use crate::intent::Intent;
use crate::llm::ChatModel;

const MAX_PROMPT_SOURCES: usize = 3;
const MAX_SOURCE_CONTENT: usize = 2_500;
const MAX_CONTEXT_CHARS: usize = 9_000;
const MAX_HISTORY_TURNS: usize = 8;
const MAX_HISTORY_TURN_CHARS: usize = 600;
const MAX_HISTORY_CHARS: usize = 2_000;

const FALLBACK_ANSWER: &str =
    "I couldn't gather reliable interview intel right now. Please try again shortly.";

const COACH_SYSTEM_PROMPT: &str = "\
You are PrepIntel, a sharp and encouraging interview coach. You turn fresh \
web research into a focused preparation brief.

Rules:
- Ground every claim in the provided sources and cite them inline as [S1], [S2], [S3].
- If the sources conflict, say so and explain which account is more recent or credible.
- Never invent interview questions or process details that are not in the sources.
- If the sources are thin, say what is missing and give general preparation advice clearly \
labeled as such.
- Keep the tone direct and practical. No filler, no generic pep talk.";

/// A citation-ready view of an enriched source, returned to callers alongside
/// the answer so clients can render the reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub snippet: String,
}

impl From<&EnrichedSource> for SourceRef {
    fn from(source: &EnrichedSource) -> Self {
        Self {
            id: source.id.clone(),
            title: source.title.clone(),
            url: source.url.clone(),
            source: source.source_domain.clone(),
            snippet: source.snippet.clone(),
        }
    }
}

pub struct AnswerSynthesizer {
    model: Arc<dyn ChatModel>,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Compose the brief. Model failures degrade to a fixed apology rather
    /// than an error so the conversation always gets an answer.
    pub async fn synthesize(
        &self,
        user_query: &str,
        intent: &Intent,
        sources: &[EnrichedSource],
        history: &[ChatMessage],
    ) -> (String, Vec<SourceRef>) {
        let (context, refs) = prepare_sources(sources);
        let prompt = compose_user_prompt(user_query, intent, &context, history);
        let messages = vec![ChatMessage::user(prompt)];

        let answer = match self.model.complete(COACH_SYSTEM_PROMPT, &messages, 4_000, 0.5).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Answer synthesis failed; returning fallback answer");
                FALLBACK_ANSWER.to_string()
            }
        };

        (answer, refs)
    }
}

/// Render at most three sources into citation blocks, clamping each body and
/// the combined context so the prompt stays within a predictable size.
fn prepare_sources(sources: &[EnrichedSource]) -> (String, Vec<SourceRef>) {
    let mut blocks = Vec::new();
    let mut refs = Vec::new();
    let mut used_chars = 0usize;

    for source in sources.iter().take(MAX_PROMPT_SOURCES) {
        let content = clamp_chars(&source.content, MAX_SOURCE_CONTENT);
        let block = format!(
            "[{}] {}\nSource: {}\nURL: {}\nContent:\n{}",
            source.id, source.title, source.source_domain, source.url, content
        );
        let block_chars = block.chars().count();
        if used_chars + block_chars > MAX_CONTEXT_CHARS && !blocks.is_empty() {
            break;
        }
        used_chars += block_chars;
        blocks.push(block);
        refs.push(SourceRef::from(source));
    }

    (blocks.join("\n\n"), refs)
}

fn compose_user_prompt(
    user_query: &str,
    intent: &Intent,
    context: &str,
    history: &[ChatMessage],
) -> String {
    let company = if intent.company.is_empty() { "the company" } else { &intent.company };
    let role = if intent.role.is_empty() { "the role" } else { &intent.role };
    let context = if context.is_empty() {
        "No sources were retrieved. Be upfront about that."
    } else {
        context
    };

    format!(
        "CANDIDATE QUESTION:\n{query}\n\n\
         INTERVIEW CONTEXT:\n\
         - Company: {company}\n\
         - Role: {role}\n\
         - Time until interview: {hours} hours ({guidance})\n\n\
         CONVERSATION SO FAR:\n{history}\n\n\
         RESEARCH SOURCES:\n{context}\n\n\
         OUTPUT FORMAT (use these sections, drop any with nothing grounded to say):\n\
         1. What to expect - the interview process and rounds, cited.\n\
         2. Likely questions - concrete questions or themes from the sources, cited.\n\
         3. How to prepare - prioritized for the time remaining.\n\
         4. Red flags and tips - insider observations worth knowing, cited.\n\
         5. Sources - one line per source: [S#] title (domain).",
        query = user_query.trim(),
        company = company,
        role = role,
        hours = intent.time_to_interview_hours,
        guidance = time_window_guidance(intent.time_to_interview_hours),
        history = format_history(history),
        context = context,
    )
}

fn time_window_guidance(hours: u32) -> &'static str {
    if hours <= 24 {
        "very soon: prioritize rapid review and confidence, not new material"
    } else if hours <= 48 {
        "soon: focus on the highest-signal topics and one mock run-through"
    } else {
        "enough runway for structured preparation across several sessions"
    }
}

fn format_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "No prior conversation.".to_string();
    }

    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    let mut lines = Vec::new();
    let mut used_chars = 0usize;

    for turn in &history[start..] {
        let content = clean_text(&turn.content);
        let content = clamp_chars(&content, MAX_HISTORY_TURN_CHARS);
        let line = format!("{}: {}", turn.role.to_uppercase(), content);
        let line_chars = line.chars().count();
        if used_chars + line_chars > MAX_HISTORY_CHARS && !lines.is_empty() {
            break;
        }
        used_chars += line_chars;
        lines.push(line);
    }

    lines.join("\n")
}
