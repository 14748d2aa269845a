use std::{path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Injection service at '{url}' answered {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        path: Option<PathBuf>,
    },
}
