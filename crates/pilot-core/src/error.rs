//! Error types for pilot-core

use std::time::Duration;

use thiserror::Error;

/// Main error type for pilot-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Agent service error: {0}")]
    Api(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The browser window backing the session is gone; no further tool use is possible.
    #[error("Browser window was closed.")]
    SessionClosed,

    #[error("{0}")]
    ToolExecution(String),

    #[error("Run {run_id} did not finish within {waited:?}")]
    PollTimeout { run_id: String, waited: Duration },
}

/// Result type alias for pilot-core
pub type Result<T> = std::result::Result<T, Error>;
