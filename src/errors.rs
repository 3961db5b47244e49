use thiserror::Error;

#[derive(Debug, Error)]
pub enum QvError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, QvError>;
