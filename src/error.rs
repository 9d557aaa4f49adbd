// src/error.rs
use std::io;
use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, PromRemoteError>;

/// Custom Error type for the promremote library
#[derive(Error, Debug)]
pub enum PromRemoteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Label(String),

    #[error("{0}")]
    Header(String),

    #[error("{0}")]
    Datapoint(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}
