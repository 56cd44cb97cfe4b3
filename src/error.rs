use thiserror::Error;

use crate::search::SearchError;

#[derive(Debug, Error)]
pub enum PollerError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Term source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, PollerError>;
