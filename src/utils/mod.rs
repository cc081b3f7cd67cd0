//! Utility modules for error handling, configuration and session cookies

pub mod config;
pub mod cookies;
pub mod error;

// Re-export for convenience
pub use config::ScraperConfig;
pub use cookies::{Cookie, SessionCookies};
pub use error::{FetchStage, Result, ScrapeError};
