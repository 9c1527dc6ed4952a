//! Conversation orchestration: intent classification, source refresh gating,
//! answer synthesis, and the state blob carried inside the message list.

pub mod engine;
pub mod intent;
pub mod llm;
pub mod state;
pub mod synthesis;

pub use engine::{ChatTurn, Engine};
pub use intent::{Intent, IntentClassifier};
pub use llm::ChatModel;
pub use state::AgentState;
pub use synthesis::{AnswerSynthesizer, SourceRef};
