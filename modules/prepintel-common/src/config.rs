use std::env;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // AI provider
    pub anthropic_api_key: String,
    pub intent_model: String,
    pub analysis_model: String,

    // Search (optional: an empty key disables source retrieval)
    pub tavily_api_key: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            intent_model: env::var("PREPINTEL_INTENT_MODEL")
                .unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string()),
            analysis_model: env::var("PREPINTEL_ANALYSIS_MODEL")
                .unwrap_or_else(|_| "claude-3-5-sonnet-latest".to_string()),
            tavily_api_key: env::var("TAVILY_API_KEY").unwrap_or_default(),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }

    /// Log which credentials are present without exposing their values.
    pub fn log_redacted(&self) {
        info!(
            anthropic_key = !self.anthropic_api_key.is_empty(),
            tavily_key = !self.tavily_api_key.is_empty(),
            intent_model = self.intent_model.as_str(),
            analysis_model = self.analysis_model.as_str(),
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
