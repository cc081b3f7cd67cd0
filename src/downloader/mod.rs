//! Download engine module

pub mod batch;
pub mod engine;

// Re-export for convenience
pub use batch::{DownloadJob, DownloadOptions, DownloadReport};
pub use engine::DownloadEngine;
