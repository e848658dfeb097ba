//! Render strategies: drive a remote browser session to capture cameras
//! that only exist behind JavaScript.
//!
//! Both strategies walk the same session lifecycle
//! (`Idle → SessionOpen → Navigated → [steps] → Captured → SessionClosed`);
//! any failure jumps straight to the close. The session is acquired and
//! released here, exactly once per capture.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{CameraSpec, CaptureError, CaptureStrategy, sanitized_filename};
use crate::module::browser::{RenderSession, SessionProvider, WaitUntil};

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);
const IMAGE_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

const PLAY_CONTROL: &str = ".play-wrapper";
const PLAY_CONTROL_TIMEOUT: Duration = Duration::from_secs(25);
/// Live streams need a while after pressing play before the frame is clean.
const PLAYBACK_SETTLE: Duration = Duration::from_secs(30);
const FULLSCREEN_CONTROL: &str = "button[data-fullscreen]";
const FULLSCREEN_CONTROL_TIMEOUT: Duration = Duration::from_secs(10);
const FULLSCREEN_SETTLE: Duration = Duration::from_secs(3);
/// Fixed viewport so the full-page shot has deterministic framing.
const VIEWPORT: (u32, u32) = (1920, 1080);

/// Capture one render-strategy camera, guaranteeing session release on
/// every exit path.
pub async fn capture(
    provider: &dyn SessionProvider,
    camera: &CameraSpec,
    out_dir: &Path,
) -> Result<PathBuf, CaptureError> {
    let session = provider.open_session().await?;
    let result = match camera.strategy {
        CaptureStrategy::SimpleRender => capture_simple(session.as_ref(), camera, out_dir).await,
        CaptureStrategy::InteractiveRender => {
            capture_interactive(session.as_ref(), camera, out_dir).await
        }
        CaptureStrategy::StaticScrape => Err(CaptureError::Aborted(
            "static cameras do not use a render session".to_string(),
        )),
    };
    if let Err(e) = session.close().await {
        tracing::warn!("Failed to release render session for '{}': {}", camera.name, e);
    }
    result
}

async fn capture_simple(
    session: &dyn RenderSession,
    camera: &CameraSpec,
    out_dir: &Path,
) -> Result<PathBuf, CaptureError> {
    tracing::info!("📸 Processing simple render camera: {}", camera.name);

    let selector = camera
        .image_selector()
        .ok_or_else(|| CaptureError::MissingElement("<no image id configured>".to_string()))?;

    let page = session.open_page().await?;
    page.navigate(&camera.page_url, WaitUntil::DomContentLoaded, NAVIGATION_TIMEOUT)
        .await?;
    page.wait_for_visible(&selector, IMAGE_WAIT_TIMEOUT).await?;
    let bytes = page.screenshot_element(&selector).await?;

    let path = out_dir.join(sanitized_filename(&camera.name, "png"));
    tokio::fs::write(&path, &bytes).await?;
    tracing::info!("Simple capture '{}' saved.", camera.name);
    Ok(path)
}

async fn capture_interactive(
    session: &dyn RenderSession,
    camera: &CameraSpec,
    out_dir: &Path,
) -> Result<PathBuf, CaptureError> {
    tracing::info!("🤖 Processing interactive camera: {}", camera.name);

    let page = session.open_page().await?;
    page.set_viewport(VIEWPORT.0, VIEWPORT.1).await?;
    // The player only initializes once the page has gone quiet.
    page.navigate(&camera.page_url, WaitUntil::NetworkSettled, NAVIGATION_TIMEOUT)
        .await?;

    page.wait_for_visible(PLAY_CONTROL, PLAY_CONTROL_TIMEOUT).await?;
    // The play overlay intercepts pointer events; trigger it from script.
    page.evaluate(&format!("document.querySelector(\"{PLAY_CONTROL}\").click()"))
        .await?;
    tokio::time::sleep(PLAYBACK_SETTLE).await;

    page.wait_for_visible(FULLSCREEN_CONTROL, FULLSCREEN_CONTROL_TIMEOUT)
        .await?;
    page.click(FULLSCREEN_CONTROL).await?;
    tokio::time::sleep(FULLSCREEN_SETTLE).await;

    let bytes = page.screenshot_full_page().await?;

    let path = out_dir.join(sanitized_filename(&camera.name, "png"));
    tokio::fs::write(&path, &bytes).await?;
    tracing::info!("Interactive capture '{}' saved.", camera.name);
    Ok(path)
}
