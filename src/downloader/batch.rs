//! Bulk download options and reporting

use crate::extractor::models::SkippedItem;
use std::path::PathBuf;

/// Options for downloading a user's videos
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Parent directory; a `<username>` folder is created inside.
    /// Defaults to the configured download directory.
    pub path: Option<PathBuf>,

    /// Keep the platform watermark instead of resolving the watermark-free variant
    pub watermark: bool,
}

/// One media file to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Video id, used as the file stem
    pub id: String,
    pub url: String,
}

/// Outcome of a bulk download
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    /// Folder the files were written to
    pub directory: PathBuf,
    /// Files written, in feed order
    pub saved: Vec<PathBuf>,
    /// Videos that could not be mapped or downloaded
    pub skipped: Vec<SkippedItem>,
}

impl DownloadReport {
    pub fn attempted(&self) -> usize {
        self.saved.len() + self.skipped.len()
    }
}
