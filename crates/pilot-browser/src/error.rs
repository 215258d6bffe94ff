//! Error types for pilot-browser

use thiserror::Error;

/// pilot-browser error type
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Browser initialization failed: {0}")]
    Initialization(String),

    /// The window was closed; every later action fails the same way
    #[error("Browser window was closed.")]
    SessionClosed,

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Interaction failed: {0}")]
    Interaction(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<BrowserError> for pilot_core::Error {
    fn from(e: BrowserError) -> Self {
        match e {
            BrowserError::SessionClosed => pilot_core::Error::SessionClosed,
            other => pilot_core::Error::ToolExecution(other.to_string()),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BrowserError>;
