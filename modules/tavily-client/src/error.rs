use thiserror::Error;

pub type Result<T> = std::result::Result<T, TavilyError>;

#[derive(Debug, Error)]
pub enum TavilyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TavilyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TavilyError::Decode(err.to_string())
        } else {
            TavilyError::Network(err.to_string())
        }
    }
}
