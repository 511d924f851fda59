use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::{
    api::{ApiError, MediaSource},
    domain::{
        DownloadEvent, DownloadPlan, FailedItem, FetchError, FetchReport, MediaDescriptor,
        Membership,
    },
};

/// Items smaller than this are treated as icons, avatars and the like.
pub const DEFAULT_MIN_BYTES: u64 = 5 * 1024;

/// Receives per-item progress while a plan runs.
pub trait ProgressSink {
    fn report(&mut self, event: DownloadEvent);
}

impl<F: FnMut(DownloadEvent)> ProgressSink for F {
    fn report(&mut self, event: DownloadEvent) {
        self(event)
    }
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Upper bound for a single attempt at one item.
    pub item_timeout: Duration,
    /// Extra attempts after the first failure.
    pub item_retries: u32,
    pub retry_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            item_timeout: Duration::from_secs(60),
            item_retries: 1,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Drop items that are too small or not downloadable, keeping source order.
pub fn filter_trivial(descriptors: &[MediaDescriptor], min_bytes: u64) -> Vec<MediaDescriptor> {
    descriptors
        .iter()
        .filter(|d| d.is_downloadable && d.approximate_size_bytes >= min_bytes)
        .cloned()
        .collect()
}

/// Sum of advertised sizes. Sizes come from the remote side, so the total
/// saturates instead of overflowing.
pub fn estimate_bytes(descriptors: &[MediaDescriptor]) -> u64 {
    descriptors
        .iter()
        .fold(0u64, |total, d| total.saturating_add(d.approximate_size_bytes))
}

pub fn plan(
    descriptors: &[MediaDescriptor],
    requested_count: usize,
) -> Result<DownloadPlan, FetchError> {
    let total_count = descriptors.len();
    if requested_count == 0 || requested_count > total_count {
        return Err(FetchError::InvalidRequestCount {
            requested: requested_count,
            available: total_count,
        });
    }

    let estimated_total_bytes = estimate_bytes(descriptors);
    let requested_bytes = estimate_bytes(&descriptors[..requested_count]);

    Ok(DownloadPlan {
        total_count,
        estimated_total_bytes,
        requested_count,
        requested_bytes,
    })
}

/// Runs the enumerate and fetch stages against one media source.
///
/// Items are fetched strictly one after another. Files are numbered from 1 in
/// plan order with no gaps: a failed item gives up its number to the next
/// item that succeeds, and is reported by its plan position instead.
pub struct DownloadCoordinator<S> {
    source: Arc<S>,
    settings: FetchSettings,
}

impl<S: MediaSource> DownloadCoordinator<S> {
    pub fn new(source: Arc<S>, settings: FetchSettings) -> Self {
        Self { source, settings }
    }

    pub async fn enumerate(&self, target: &str) -> Result<Vec<MediaDescriptor>, FetchError> {
        let unavailable = |e: ApiError| FetchError::SourceUnavailable(e.to_string());

        match self
            .source
            .ensure_membership(target)
            .await
            .map_err(unavailable)?
        {
            Membership::Joined => info!("Joined {}", target),
            Membership::AlreadyMember => debug!("Already a member of {}", target),
            Membership::NotRequired => {}
        }

        let descriptors = self.source.enumerate(target).await.map_err(unavailable)?;
        info!("{} lists {} candidate items", target, descriptors.len());
        Ok(descriptors)
    }

    pub async fn fetch_all(
        &self,
        plan: &DownloadPlan,
        descriptors: &[MediaDescriptor],
        destination: &Path,
        progress: &mut dyn ProgressSink,
    ) -> FetchReport {
        let mut report = FetchReport::new(destination.to_path_buf());
        let total = plan.requested_count.min(descriptors.len());

        for (offset, descriptor) in descriptors.iter().take(total).enumerate() {
            let position = offset + 1;
            let file_name = format!(
                "{}.{}",
                report.saved.len() + 1,
                descriptor.suggested_extension
            );
            let path = destination.join(&file_name);

            progress.report(DownloadEvent::Started {
                position,
                total,
                file_name,
            });

            match self
                .fetch_item(descriptor, &path, position, total, &mut *progress)
                .await
            {
                Ok(bytes) => {
                    info!("[{}/{}] Saved {} ({} bytes)", position, total, path.display(), bytes);
                    report.bytes_written = report.bytes_written.saturating_add(bytes);
                    report.saved.push(path.clone());
                    progress.report(DownloadEvent::Completed {
                        position,
                        total,
                        path,
                        bytes,
                    });
                }
                Err(reason) => {
                    error!("[{}/{}] {} failed: {}", position, total, descriptor.locator, reason);
                    report.failed.push(FailedItem {
                        position,
                        reason: reason.clone(),
                    });
                    progress.report(DownloadEvent::Failed {
                        position,
                        total,
                        error: FetchError::ItemDownloadFailed { position, reason },
                    });
                }
            }
        }

        info!(
            "Run finished in {}: {} saved, {} bytes, failed positions {:?}",
            destination.display(),
            report.saved.len(),
            report.bytes_written,
            report.failed_positions()
        );
        report
    }

    /// One item with timeout and retries. A failed attempt leaves no file behind.
    async fn fetch_item(
        &self,
        descriptor: &MediaDescriptor,
        path: &Path,
        position: usize,
        total: usize,
        progress: &mut dyn ProgressSink,
    ) -> Result<u64, String> {
        let attempts = self.settings.item_retries + 1;
        let mut attempt = 1;

        loop {
            let outcome = match tokio::time::timeout(
                self.settings.item_timeout,
                self.stream_to_file(descriptor, path, position, total, &mut *progress),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(format!("timed out after {:?}", self.settings.item_timeout)),
            };

            let reason = match outcome {
                Ok(bytes) => return Ok(bytes),
                Err(reason) => reason,
            };

            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Could not remove partial file {}: {}", path.display(), e);
                }
            }

            if attempt >= attempts {
                return Err(reason);
            }
            warn!(
                "[{}/{}] attempt {}/{} failed: {}, retrying",
                position, total, attempt, attempts, reason
            );
            attempt += 1;
            if !self.settings.retry_delay.is_zero() {
                tokio::time::sleep(self.settings.retry_delay).await;
            }
        }
    }

    async fn stream_to_file(
        &self,
        descriptor: &MediaDescriptor,
        path: &Path,
        position: usize,
        total: usize,
        progress: &mut dyn ProgressSink,
    ) -> Result<u64, String> {
        let (expected, mut stream) = self
            .source
            .open(descriptor)
            .await
            .map_err(|e| e.to_string())?;

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| format!("Failed to create file: {}", e))?;

        let mut downloaded = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            file.write_all(&chunk)
                .await
                .map_err(|e| format!("Write error: {}", e))?;

            downloaded += chunk.len() as u64;
            progress.report(DownloadEvent::Progress {
                position,
                total,
                downloaded,
                expected,
            });
        }

        file.sync_all()
            .await
            .map_err(|e| format!("Failed to sync file: {}", e))?;

        if downloaded == 0 {
            return Err("empty response".to_string());
        }
        Ok(downloaded)
    }
}
