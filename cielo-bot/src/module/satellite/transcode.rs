//! External transcoder contract and the ffmpeg implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Missing binary is an environment problem, terminal for every map.
    #[error("ffmpeg binary not found on PATH")]
    BinaryMissing,

    #[error("ffmpeg exited with status {0}")]
    Failed(std::process::ExitStatus),

    #[error("failed to run ffmpeg: {0}")]
    Io(std::io::Error),
}

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert the raw animation at `input` into a streaming-ready video
    /// at `output`.
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;
}

pub struct FfmpegTranscoder;

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        tracing::info!("Converting {:?} to MP4...", input.file_name().unwrap_or_default());

        let status = Command::new("ffmpeg")
            .arg("-i")
            .arg(input)
            // Even dimensions and yuv420p keep the output playable in chat
            // clients; faststart moves the moov atom up for streaming.
            .args([
                "-movflags",
                "faststart",
                "-pix_fmt",
                "yuv420p",
                "-vf",
                "scale=trunc(iw/2)*2:trunc(ih/2)*2",
                "-y",
            ])
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::BinaryMissing
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        if !status.success() {
            return Err(TranscodeError::Failed(status));
        }
        tracing::info!("MP4 conversion completed.");
        Ok(())
    }
}
