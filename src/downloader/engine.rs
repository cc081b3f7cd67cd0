//! Streaming download of media files

use crate::downloader::batch::{DownloadJob, DownloadReport};
use crate::extractor::endpoints::is_video_id;
use crate::extractor::models::SkippedItem;
use anyhow::{anyhow, Context, Result};
use futures::TryStreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

/// Sequential media downloader
#[derive(Clone)]
pub struct DownloadEngine {
    client: Client,
}

impl DownloadEngine {
    /// Share the scraper's HTTP client so media requests carry the same user-agent
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download `url` to `output_path`, returning the number of bytes written.
    ///
    /// Data goes to a `.part` sibling first and is renamed into place only once
    /// complete, so an earlier good file is never replaced by a truncated one.
    pub async fn download(&self, url: &str, output_path: &Path) -> Result<u64> {
        debug!("Downloading {} -> {:?}", url, output_path);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {}", response.status()));
        }

        let part_path = part_path(output_path);
        let written = match write_stream(response, &part_path).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&part_path).await {
                    warn!("Failed to remove partial file {:?}: {}", part_path, cleanup);
                }
                return Err(e);
            }
        };

        fs::rename(&part_path, output_path)
            .await
            .with_context(|| format!("Failed to move download into {:?}", output_path))?;

        Ok(written)
    }

    /// Download every job into `directory` as `<id>.mp4`.
    ///
    /// A failing job is logged and recorded as skipped; the batch always runs to the end.
    pub async fn download_batch(
        &self,
        jobs: Vec<DownloadJob>,
        directory: &Path,
    ) -> std::io::Result<DownloadReport> {
        fs::create_dir_all(directory).await?;

        let mut report = DownloadReport {
            directory: directory.to_path_buf(),
            ..Default::default()
        };

        let total = jobs.len();
        for (index, job) in jobs.into_iter().enumerate() {
            // Ids come from remote JSON; anything but digits could leave `directory`
            if !is_video_id(&job.id) {
                warn!("[{}/{}] Skipping unsafe video id {:?}", index + 1, total, job.id);
                report.skipped.push(SkippedItem {
                    reason: format!("video id {:?} is not numeric", job.id),
                    id: Some(job.id),
                });
                continue;
            }

            let target = directory.join(format!("{}.mp4", job.id));
            match self.download(&job.url, &target).await {
                Ok(bytes) => {
                    info!("[{}/{}] Saved {} ({} bytes)", index + 1, total, job.id, bytes);
                    report.saved.push(target);
                }
                Err(e) => {
                    warn!("[{}/{}] Skipping {}: {:#}", index + 1, total, job.id, e);
                    report.skipped.push(SkippedItem {
                        id: Some(job.id),
                        reason: format!("{:#}", e),
                    });
                }
            }
        }

        Ok(report)
    }
}

fn part_path(output_path: &Path) -> PathBuf {
    let mut name = output_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn write_stream(response: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path)
        .await
        .with_context(|| format!("Failed to create {:?}", path))?;

    let stream = response.bytes_stream().map_err(std::io::Error::other);
    let reader = StreamReader::new(stream);
    tokio::pin!(reader);

    let written = tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}
