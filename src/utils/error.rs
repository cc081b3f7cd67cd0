//! Error handling for ttscraper

use std::fmt;
use thiserror::Error;

/// Result alias used across the public operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Which fetch strategy was active when a page could not be obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    /// Plain HTTP GET
    Direct,
    /// Headless-browser render
    Rendered,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStage::Direct => f.write_str("direct"),
            FetchStage::Rendered => f.write_str("rendered"),
        }
    }
}

/// Main error type for ttscraper
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to fetch {url} ({stage} stage): {reason}")]
    Fetch {
        url: String,
        stage: FetchStage,
        reason: String,
    },

    #[error("Failed to parse embedded payload: {0}")]
    Parse(String),

    #[error("Payload is missing required fields: {0}")]
    Mapping(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid cookie file: {0}")]
    Cookies(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Whether the error means "this item does not exist" rather than a systemic fault.
    ///
    /// Batch operations skip items for which this returns true.
    pub fn is_missing(&self) -> bool {
        matches!(self, ScrapeError::Mapping(_) | ScrapeError::NotFound(_))
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(err: serde_json::Error) -> Self {
        ScrapeError::Parse(err.to_string())
    }
}
