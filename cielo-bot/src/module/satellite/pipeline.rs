//! Sequential driver of the satellite map extraction.
//!
//! One session and one page are shared by every map: each iteration
//! re-navigates to the start page, which doubles as the page-state reset
//! between maps. Map i+1 never starts before map i's extraction finished.

use base64::Engine;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{MapSpec, SatelliteError, Transcoder};
use crate::module::browser::{RenderPage, RenderSession, SessionProvider, WaitUntil};
use crate::module::delivery::DeliveryBatcher;

const START_PAGE_TIMEOUT: Duration = Duration::from_secs(90);
const DOWNLOAD_CONTROL: &str = "#downloadLoop";
const DOWNLOAD_CONTROL_TIMEOUT: Duration = Duration::from_secs(90);
const DOWNLOAD_SETTLE: Duration = Duration::from_secs(5);
const FRAME_IMAGE: &str = "#animatedGifWrapper img";
/// Assembling the animation server-side can take a long while.
const FRAME_WAIT_TIMEOUT: Duration = Duration::from_secs(120);
const FRAME_POLL_INTERVAL: Duration = Duration::from_secs(2);

const TEMP_ANIMATION: &str = "temp.gif";
const OUTPUT_VIDEO: &str = "video.mp4";

pub struct SatellitePipeline<'a> {
    start_url: &'a str,
    out_dir: &'a Path,
    transcoder: &'a dyn Transcoder,
    batcher: &'a DeliveryBatcher<'a>,
}

impl<'a> SatellitePipeline<'a> {
    pub fn new(
        start_url: &'a str,
        out_dir: &'a Path,
        transcoder: &'a dyn Transcoder,
        batcher: &'a DeliveryBatcher<'a>,
    ) -> Self {
        Self {
            start_url,
            out_dir,
            transcoder,
            batcher,
        }
    }

    /// Process every map in declaration order over one shared session.
    /// Returns how many videos were delivered; a failed map is logged and
    /// skipped, never aborting the remaining maps.
    pub async fn run(&self, provider: &dyn SessionProvider, maps: &[MapSpec]) -> usize {
        tracing::info!("Starting satellite video generation for {} maps.", maps.len());

        let session = match provider.open_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Could not open satellite render session: {}", e);
                return 0;
            }
        };

        let delivered = self.run_maps(session.as_ref(), maps).await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to release satellite render session: {}", e);
        }
        delivered
    }

    async fn run_maps(&self, session: &dyn RenderSession, maps: &[MapSpec]) -> usize {
        let page = match session.open_page().await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Could not open satellite page: {}", e);
                return 0;
            }
        };

        let mut delivered = 0;
        for (index, map) in maps.iter().enumerate() {
            tracing::info!(
                "Processing satellite map {}/{}: {}",
                index + 1,
                maps.len(),
                map.caption
            );

            match self.process_map(page.as_ref(), map).await {
                Ok(video) => {
                    // Delivered right away so the temp files can be reused
                    // by the next iteration.
                    match self.batcher.deliver_video(&video, &map.caption).await {
                        Ok(()) => delivered += 1,
                        Err(e) => {
                            tracing::error!("Video delivery for '{}' failed: {}", map.caption, e)
                        }
                    }
                }
                Err(e) => tracing::error!("Satellite map '{}' failed: {}", map.caption, e),
            }
        }
        delivered
    }

    async fn process_map(
        &self,
        page: &dyn RenderPage,
        map: &MapSpec,
    ) -> Result<PathBuf, SatelliteError> {
        page.navigate(self.start_url, WaitUntil::Load, START_PAGE_TIMEOUT)
            .await?;

        let link_selector = format!("a[href*=\"data_folder={}\"]", map.resource_id);
        page.click(&link_selector).await?;

        page.wait_for_visible(DOWNLOAD_CONTROL, DOWNLOAD_CONTROL_TIMEOUT)
            .await?;
        tokio::time::sleep(DOWNLOAD_SETTLE).await;
        page.evaluate(&format!(
            "document.querySelector(\"{DOWNLOAD_CONTROL}\").click()"
        ))
        .await?;

        let data_uri = wait_for_data_uri(page).await?;
        let bytes = decode_data_uri(&data_uri)?;

        let animation_path = self.out_dir.join(TEMP_ANIMATION);
        tokio::fs::write(&animation_path, &bytes).await?;

        let video_path = self.out_dir.join(OUTPUT_VIDEO);
        self.transcoder
            .transcode(&animation_path, &video_path)
            .await?;
        Ok(video_path)
    }
}

/// Condition-wait (not a fixed sleep) for the inline frame element to be
/// populated with an embedded data URI.
async fn wait_for_data_uri(page: &dyn RenderPage) -> Result<String, SatelliteError> {
    let deadline = tokio::time::Instant::now() + FRAME_WAIT_TIMEOUT;
    loop {
        if let Some(src) = page.attribute(FRAME_IMAGE, "src").await? {
            if src.starts_with("data:") {
                return Ok(src);
            }
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(SatelliteError::FrameWait(FRAME_WAIT_TIMEOUT));
        }
        tokio::time::sleep(FRAME_POLL_INTERVAL).await;
    }
}

/// Split off and decode the payload of an embedded data URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, SatelliteError> {
    let (_, payload) = uri.split_once(',').ok_or(SatelliteError::MalformedDataUri)?;
    Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
}
