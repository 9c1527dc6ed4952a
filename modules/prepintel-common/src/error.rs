use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepIntelError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
