pub mod config;
pub mod error;
pub mod text;
pub mod types;

pub use config::Config;
pub use error::PrepIntelError;
pub use text::{clamp_chars, clean_text};
pub use types::ChatMessage;
