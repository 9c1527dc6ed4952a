//! Interview-intent extraction: a strict-JSON model call with a regex and
//! keyword heuristic fallback so a model outage never breaks routing.

use std::sync::{Arc, LazyLock};

use anyhow::{anyhow, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use prepintel_common::ChatMessage;

use crate::llm::ChatModel;

const MIN_HOURS: u32 = 1;
const MAX_HOURS: u32 = 336;
const DEFAULT_HOURS: u32 = 24;
const MAX_HISTORY_TURNS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub company: String,
    pub role: String,
    pub time_to_interview_hours: u32,
    pub level: String,
    pub location: String,
    pub wants_interview_intel: bool,
}

impl Default for Intent {
    fn default() -> Self {
        Self {
            company: String::new(),
            role: String::new(),
            time_to_interview_hours: DEFAULT_HOURS,
            level: String::new(),
            location: String::new(),
            wants_interview_intel: false,
        }
    }
}

const SYSTEM_PROMPT: &str = r#"You are IntentJSON, a deterministic classification service operating in strict JSON mode.

Contract:
1. Always respond with exactly one JSON object and nothing else (no markdown, code fences, narration, or trailing commas).
2. The JSON object MUST include the following keys and value types:
   - "company": string (use "" if unknown)
   - "role": string (use "" if unknown)
   - "time_to_interview_hours": integer between 1 and 336
   - "level": string (use "" if not provided)
   - "location": string (use "" if not provided)
   - "wants_interview_intel": boolean
3. Do not invent facts. Extract only from the conversation.
4. wants_interview_intel = true when the user asks about interview questions, tips, what to expect, or insider knowledge.
5. Convert all temporal language into hours:
   - "later today", "today", or "tonight" => 12
   - "tomorrow" => 24
   - "day after tomorrow" => 48
   - "this weekend" => 72
   - "early next week" => 120
   - "next week" => 168
   - "two weeks", "fortnight" => 336
   - "next month" or anything longer => 336
   - "in X hours" => X
   - "in X days" => X * 24
   - "in X weeks" => X * 168
   - If a precise datetime is given, compute the approximate hour delta (clamp to 1-336).
6. When time is unspecified, default to 24 hours.

The JSON response must strictly follow:
{
  "company": "",
  "role": "",
  "time_to_interview_hours": 24,
  "level": "",
  "location": "",
  "wants_interview_intel": false
}"#;

pub struct IntentClassifier {
    model: Arc<dyn ChatModel>,
}

impl IntentClassifier {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Extract intent signals from the latest query plus history. Falls back
    /// to heuristics when the model call or its JSON output is unusable, and
    /// always enriches the result against conversation context.
    pub async fn extract(&self, user_query: &str, history: &[ChatMessage]) -> Intent {
        let prompt = build_user_prompt(user_query, history);
        let messages = vec![ChatMessage::user(prompt)];

        let intent = match self.model.complete(SYSTEM_PROMPT, &messages, 256, 0.0).await {
            Ok(raw) => match parse_intent_json(&raw) {
                Ok(intent) => intent,
                Err(e) => {
                    warn!(error = %e, "Intent JSON unusable; using heuristic fallback");
                    heuristic_intent(user_query, history)
                }
            },
            Err(e) => {
                warn!(error = %e, "Intent model call failed; using heuristic fallback");
                heuristic_intent(user_query, history)
            }
        };

        enrich_with_context(intent, user_query, history)
    }
}

fn build_user_prompt(user_query: &str, history: &[ChatMessage]) -> String {
    format!(
        "Conversation history (oldest to newest):\n{}\n\n\
         Latest user message:\n{}\n\n\
         Return ONLY the JSON object described in the system prompt.",
        format_history(history),
        user_query.trim()
    )
}

fn format_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "None.".to_string();
    }
    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    history[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.role.to_uppercase(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

// --- Model-output parsing ---

fn parse_intent_json(raw: &str) -> Result<Intent> {
    let value: Value = serde_json::from_str(raw.trim())?;
    let obj = value
        .as_object()
        .ok_or_else(|| anyhow!("model output is not a JSON object"))?;

    Ok(Intent {
        company: coerce_str(obj.get("company")),
        role: coerce_str(obj.get("role")),
        time_to_interview_hours: coerce_hours(obj.get("time_to_interview_hours")),
        level: coerce_str(obj.get("level")),
        location: coerce_str(obj.get("location")),
        wants_interview_intel: coerce_bool(obj.get("wants_interview_intel")),
    })
}

fn coerce_str(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "t" | "yes" | "y" | "1")
        }
        _ => false,
    }
}

fn coerce_hours(value: Option<&Value>) -> u32 {
    let hours = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match hours {
        Some(h) if h.is_finite() => clamp_hours(h as i64),
        _ => DEFAULT_HOURS,
    }
}

fn clamp_hours(value: i64) -> u32 {
    value.clamp(MIN_HOURS as i64, MAX_HOURS as i64) as u32
}

// --- Heuristic fallback ---

const ROLE_HINTS: &[&str] = &[
    "analyst",
    "associate",
    "architect",
    "consultant",
    "coordinator",
    "designer",
    "developer",
    "director",
    "engineer",
    "intern",
    "lead",
    "manager",
    "marketer",
    "owner",
    "pm",
    "principal",
    "product manager",
    "program manager",
    "project manager",
    "recruiter",
    "representative",
    "researcher",
    "scientist",
    "specialist",
    "strategist",
];

const PHRASE_TO_HOURS: &[(&str, u32)] = &[
    ("day after tomorrow", 48),
    ("day-after-tomorrow", 48),
    ("later today", 12),
    ("today", 12),
    ("tonight", 12),
    ("tomorrow", 24),
    ("this weekend", 72),
    ("weekend", 72),
    ("early next week", 120),
    ("next week", 168),
    ("in a week", 168),
    ("two weeks", 336),
    ("2 weeks", 336),
    ("fortnight", 336),
    ("next month", 336),
];

static IN_HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)in\s+(\d+)\s+(?:hours?|hrs?)").expect("valid regex"));
static IN_DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)in\s+(\d+)\s+days?").expect("valid regex"));
static IN_WEEKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)in\s+(\d+)\s+weeks?").expect("valid regex"));
static ROLE_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(role|position|job)\b").expect("valid regex"));

const COMPANY_TOKEN: &str = r"[A-Z][A-Za-z0-9&./+-]*";
const ROLE_BODY: &str = r"[A-Za-z][A-Za-z0-9/&+ .-]{0,80}";

static COMPANY_ROLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let company = format!(r"{COMPANY_TOKEN}(?:\s+{COMPANY_TOKEN}){{0,3}}");
    [
        format!(r"(?i)\bhave\s+(?:an|a)\s+(?P<company>{company})\s+(?P<role>{ROLE_BODY})\s+interview"),
        format!(r"(?i)\binterview\s+with\s+(?P<company>{company})(?:[^.?!]*?\bfor\s+(?P<role>{ROLE_BODY}))?"),
        format!(r"(?i)\binterview\s+at\s+(?P<company>{company})(?:[^.?!]*?\bfor\s+(?P<role>{ROLE_BODY}))?"),
        format!(r"(?i)\b(?P<company>{company})\s+(?P<role>{ROLE_BODY})\s+interview"),
    ]
    .into_iter()
    .map(|p| Regex::new(&p).expect("valid regex"))
    .collect()
});

fn heuristic_intent(user_query: &str, history: &[ChatMessage]) -> Intent {
    let blob = compose_text_blob(user_query, history);
    let (company, role) = guess_company_role(&blob);

    Intent {
        company,
        role,
        time_to_interview_hours: infer_time_hours(&blob),
        wants_interview_intel: infer_wants_interview_intel(user_query),
        ..Intent::default()
    }
}

fn enrich_with_context(mut intent: Intent, user_query: &str, history: &[ChatMessage]) -> Intent {
    let blob = compose_text_blob(user_query, history);
    let (company, role) = guess_company_role(&blob);

    if intent.company.is_empty() && !company.is_empty() {
        intent.company = company;
    }
    if intent.role.is_empty() && !role.is_empty() {
        intent.role = role;
    }
    if !intent.wants_interview_intel && infer_wants_interview_intel(user_query) {
        intent.wants_interview_intel = true;
    }
    intent.time_to_interview_hours = clamp_hours(intent.time_to_interview_hours as i64);
    intent
}

fn compose_text_blob(user_query: &str, history: &[ChatMessage]) -> String {
    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    let mut parts: Vec<&str> = history[start..]
        .iter()
        .map(|turn| turn.content.as_str())
        .collect();
    if !user_query.is_empty() {
        parts.push(user_query);
    }
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn guess_company_role(text: &str) -> (String, String) {
    let mut best_company = String::new();
    let mut best_role = String::new();

    for pattern in COMPANY_ROLE_PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let company = clean_company(caps.name("company").map_or("", |m| m.as_str()));
        let role = clean_role(caps.name("role").map_or("", |m| m.as_str()));

        if !company.is_empty() && best_company.is_empty() {
            best_company = company.clone();
        }
        if !role.is_empty() && looks_like_role(&role) {
            if best_role.is_empty() {
                best_role = role.clone();
            }
            let resolved = if company.is_empty() {
                best_company.clone()
            } else {
                company
            };
            if !resolved.is_empty() {
                return (resolved, role);
            }
        }
    }

    (best_company, best_role)
}

fn clean_company(candidate: &str) -> String {
    candidate
        .trim_matches(|c: char| " .,!?:;-".contains(c))
        .to_string()
}

fn clean_role(candidate: &str) -> String {
    let stripped = candidate.trim_matches(|c: char| " .,!?:;-".contains(c));
    let without_noise = ROLE_NOISE_RE.replace_all(stripped, "");
    without_noise.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn looks_like_role(role: &str) -> bool {
    let lowered = role.to_lowercase();
    ROLE_HINTS.iter().any(|hint| lowered.contains(hint))
}

fn infer_time_hours(text: &str) -> u32 {
    let lowered = text.to_lowercase();
    for (phrase, hours) in PHRASE_TO_HOURS {
        if lowered.contains(phrase) {
            return *hours;
        }
    }

    for (re, multiplier) in [(&IN_HOURS_RE, 1), (&IN_DAYS_RE, 24), (&IN_WEEKS_RE, 168)] {
        if let Some(caps) = re.captures(&lowered) {
            if let Ok(n) = caps[1].parse::<i64>() {
                return clamp_hours(n.saturating_mul(multiplier));
            }
        }
    }

    DEFAULT_HOURS
}

fn infer_wants_interview_intel(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ["interview", "intel", "tips", "questions", "process", "prep", "coach", "brief"]
        .iter()
        .any(|keyword| lowered.contains(keyword))
}
