//! Satellite animation pipeline: extract embedded animation loops from
//! the RAMMB map pages, transcode them, and deliver one video per map.

use thiserror::Error;

use super::browser::BrowserError;

pub mod pipeline;
pub mod transcode;

pub use pipeline::SatellitePipeline;
pub use transcode::{FfmpegTranscoder, TranscodeError, Transcoder};

#[derive(Debug, Clone)]
pub struct MapSpec {
    /// Resource id used by the source site's `data_folder` links.
    pub resource_id: String,
    pub caption: String,
}

impl MapSpec {
    pub fn new(resource_id: &str, caption: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            caption: caption.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SatelliteError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("animation frame did not expose a data URI within {0:?}")]
    FrameWait(std::time::Duration),

    #[error("malformed data URI in animation frame")]
    MalformedDataUri,

    #[error("embedded animation payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error("failed to persist animation: {0}")]
    Io(#[from] std::io::Error),
}
