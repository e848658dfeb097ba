//! Delivery batcher: turns capture reports into paced channel traffic.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::camera::CaptureReport;

pub mod telegram;

pub use telegram::TelegramClient;

/// Hard cap of the channel's album endpoint.
pub const MAX_MEDIA_GROUP: usize = 10;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered but rejected the payload.
    #[error("channel API rejected the request: {0}")]
    Api(String),

    #[error("could not read media file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct MediaPhoto {
    pub path: PathBuf,
    pub caption: String,
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<(), DeliveryError>;
    async fn send_media_group(&self, photos: &[MediaPhoto]) -> Result<(), DeliveryError>;
    async fn send_video(&self, video: &Path, caption: &str) -> Result<(), DeliveryError>;
}

pub struct DeliveryBatcher<'a> {
    messenger: &'a dyn Messenger,
    pacing: Duration,
}

impl<'a> DeliveryBatcher<'a> {
    pub fn new(messenger: &'a dyn Messenger, pacing: Duration) -> Self {
        Self { messenger, pacing }
    }

    /// Send the text report followed by every usable capture, chunked to
    /// the album cap with a pacing pause between chunks. Failures are
    /// logged per message and never abort the remaining chunks.
    pub async fn deliver_report(&self, text: &str, reports: &[CaptureReport]) {
        tracing::info!("Sending main report to the channel.");

        if let Err(e) = self.messenger.send_text(text).await {
            tracing::error!("Text report failed to send: {}", e);
        } else {
            tracing::info!("Text report sent.");
        }

        let photos = usable_photos(reports).await;
        if photos.is_empty() {
            tracing::warn!("No valid images to send.");
            return;
        }

        for chunk in photos.chunks(MAX_MEDIA_GROUP) {
            match self.messenger.send_media_group(chunk).await {
                Ok(()) => tracing::info!("Group of {} images sent.", chunk.len()),
                Err(e) => tracing::error!("Media group of {} failed: {}", chunk.len(), e),
            }
            tokio::time::sleep(self.pacing).await;
        }
    }

    pub async fn deliver_video(&self, video: &Path, caption: &str) -> Result<(), DeliveryError> {
        tracing::info!("Sending video {:?} to the channel.", video.file_name().unwrap_or_default());
        self.messenger.send_video(video, caption).await?;
        tracing::info!("Video sent.");
        tokio::time::sleep(self.pacing).await;
        Ok(())
    }
}

/// Keep only captures whose file exists and is non-empty. A zero-byte
/// screenshot upsets the album endpoint more than a missing one. The
/// stat runs through tokio's fs layer to stay off the cooperative lane.
async fn usable_photos(reports: &[CaptureReport]) -> Vec<MediaPhoto> {
    let mut photos = Vec::new();
    for report in reports {
        let Some(path) = report.path() else { continue };
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.len() > 0 => photos.push(MediaPhoto {
                path: path.to_path_buf(),
                caption: report.camera.clone(),
            }),
            _ => tracing::warn!("Skipping unusable capture for '{}'.", report.camera),
        }
    }
    photos
}
