use thiserror::Error;

use crate::assertion::JsonPathError;

#[derive(Error, Debug)]
pub enum HttpTesterError {
    /// A failure that has already been handed to the reporter. Carries the
    /// full message as reported.
    #[error("{0}")]
    Failure(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid body template: {0}")]
    Template(String),

    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot JSON parse an empty string")]
    EmptyJson,

    #[error(transparent)]
    JsonPath(#[from] JsonPathError),

    #[error("config error: {0}")]
    Config(String),
}

impl HttpTesterError {
    /// True once the error has been routed through a reporter.
    pub fn is_reported(&self) -> bool {
        matches!(self, HttpTesterError::Failure(_))
    }
}

/// Result type for httptester crate
pub type Result<T> = std::result::Result<T, HttpTesterError>;
