//! Webcam capture: one descriptor per camera, one typed report per run.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::browser::BrowserError;

pub mod render;
pub mod scheduler;
pub mod static_scrape;

/// Acquisition strategy tag. Dispatch happens once, in the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStrategy {
    /// Plain HTTP fetch + markup parse; runs on the blocking lane.
    StaticScrape,
    /// Navigate, wait for the image element, screenshot it.
    SimpleRender,
    /// Drive playback and fullscreen controls before a full-page screenshot.
    InteractiveRender,
}

#[derive(Debug, Clone)]
pub struct CameraSpec {
    /// Unique within a run; also namespaces the output file.
    pub name: String,
    pub page_url: String,
    /// Base for resolving relative image links; falls back to `page_url`.
    pub base_url: Option<String>,
    /// DOM id of the target image element, where the strategy needs one.
    pub image_id: Option<String>,
    pub strategy: CaptureStrategy,
}

impl CameraSpec {
    pub fn image_selector(&self) -> Option<String> {
        self.image_id.as_ref().map(|id| format!("img#{id}"))
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid image url: {0}")]
    BadUrl(#[from] url::ParseError),

    #[error("element '{0}' not found in page")]
    MissingElement(String),

    #[error("image downloaded but empty")]
    EmptyPayload,

    #[error("capture timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("could not persist capture: {0}")]
    Io(#[from] std::io::Error),

    #[error("capture task aborted: {0}")]
    Aborted(String),
}

/// Per-camera outcome. Exactly one is produced per configured camera per
/// run; a failure here never suppresses the reports of sibling cameras.
#[derive(Debug)]
pub struct CaptureReport {
    pub camera: String,
    pub outcome: Result<PathBuf, CaptureError>,
}

impl CaptureReport {
    pub fn path(&self) -> Option<&Path> {
        self.outcome.as_deref().ok()
    }
}

/// Output file name derived from the camera name: lowercased, spaces
/// replaced, so concurrent writers never collide.
pub fn sanitized_filename(name: &str, extension: &str) -> String {
    format!("{}.{extension}", name.replace(' ', "_").to_lowercase())
}
