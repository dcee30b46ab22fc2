use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("document store error: {0}")]
    DocumentStore(String),
    #[error("messaging error: {0}")]
    Messaging(String),
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
