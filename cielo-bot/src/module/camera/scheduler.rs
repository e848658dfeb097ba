//! Capture scheduler: one task per configured camera, gathered without
//! fail-fast semantics. Static scrapes run on the blocking lane, render
//! captures as cooperative tasks bounded by the configured timeout.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::{CameraSpec, CaptureError, CaptureReport, CaptureStrategy, render, static_scrape};
use crate::module::browser::SessionProvider;

/// Capture every configured camera concurrently and wait for all of them
/// to reach a terminal state. Returns exactly one report per camera; a
/// single camera's failure or timeout never cancels its siblings.
pub async fn capture_all(
    provider: Arc<dyn SessionProvider>,
    cameras: &[CameraSpec],
    out_dir: &Path,
    render_timeout: Duration,
) -> Vec<CaptureReport> {
    tracing::info!("Starting webcam capture for {} cameras.", cameras.len());

    let tasks = cameras.iter().map(|camera| {
        run_camera(
            provider.clone(),
            camera.clone(),
            out_dir.to_path_buf(),
            render_timeout,
        )
    });
    let reports = futures::future::join_all(tasks).await;

    let succeeded = reports.iter().filter(|r| r.outcome.is_ok()).count();
    tracing::info!("Webcam capture finished: {}/{} succeeded.", succeeded, reports.len());
    reports
}

async fn run_camera(
    provider: Arc<dyn SessionProvider>,
    camera: CameraSpec,
    out_dir: PathBuf,
    render_timeout: Duration,
) -> CaptureReport {
    let name = camera.name.clone();
    let outcome = match camera.strategy {
        CaptureStrategy::StaticScrape => static_scrape::capture(&camera, &out_dir).await,
        CaptureStrategy::SimpleRender | CaptureStrategy::InteractiveRender => {
            run_render(provider, camera, out_dir, render_timeout).await
        }
    };

    match &outcome {
        Ok(path) => tracing::info!("Camera '{}' captured to {:?}", name, path),
        Err(e) => tracing::error!("Camera '{}' failed: {}", name, e),
    }
    CaptureReport { camera: name, outcome }
}

async fn run_render(
    provider: Arc<dyn SessionProvider>,
    camera: CameraSpec,
    out_dir: PathBuf,
    render_timeout: Duration,
) -> Result<PathBuf, CaptureError> {
    // Spawned rather than polled inline: when the timeout fires the task
    // is abandoned but keeps running, so its session release still
    // happens (best-effort leak avoidance).
    let handle =
        tokio::spawn(async move { render::capture(provider.as_ref(), &camera, &out_dir).await });

    match tokio::time::timeout(render_timeout, handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(CaptureError::Aborted(join_error.to_string())),
        Err(_) => Err(CaptureError::Timeout(render_timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::browser::mock::{MockProvider, MockState};

    fn render_spec(name: &str, image_id: &str) -> CameraSpec {
        CameraSpec {
            name: name.to_string(),
            page_url: format!("https://example.com/{image_id}"),
            base_url: None,
            image_id: Some(image_id.to_string()),
            strategy: CaptureStrategy::SimpleRender,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_report_per_camera_despite_failures() {
        let state = Arc::new(MockState {
            fail_wait_selector: Some("img#broken".to_string()),
            ..MockState::default()
        });
        let provider: Arc<dyn SessionProvider> = Arc::new(MockProvider::new(state.clone()));
        let dir = tempfile::tempdir().unwrap();

        let cameras = vec![
            render_spec("Cam A", "a"),
            render_spec("Cam Broken", "broken"),
            render_spec("Cam B", "b"),
        ];
        let reports = capture_all(
            provider,
            &cameras,
            dir.path(),
            Duration::from_secs(240),
        )
        .await;

        assert_eq!(reports.len(), cameras.len());
        assert!(reports[0].outcome.is_ok());
        assert!(reports[1].outcome.is_err());
        assert!(reports[2].outcome.is_ok());
        // Order of reports matches the configured camera order.
        assert_eq!(reports[0].camera, "Cam A");
        assert_eq!(reports[1].camera, "Cam Broken");
        assert_eq!(reports[2].camera, "Cam B");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_contained_to_its_own_camera() {
        let state = Arc::new(MockState {
            hang_wait_selector: Some("img#stuck".to_string()),
            ..MockState::default()
        });
        let provider: Arc<dyn SessionProvider> = Arc::new(MockProvider::new(state.clone()));
        let dir = tempfile::tempdir().unwrap();

        let cameras = vec![
            render_spec("Fast One", "a"),
            render_spec("Stuck One", "stuck"),
            render_spec("Fast Two", "b"),
        ];
        let timeout = Duration::from_secs(240);
        let reports = capture_all(provider, &cameras, dir.path(), timeout).await;

        assert_eq!(reports.len(), 3);
        assert!(reports[0].outcome.is_ok());
        assert!(matches!(
            reports[1].outcome,
            Err(CaptureError::Timeout(t)) if t == timeout
        ));
        assert!(reports[2].outcome.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_catalog_shape_yields_full_report_set() {
        // Render-only fleet: every strategy but static (those hit the
        // network and are covered in static_scrape tests).
        let state = Arc::new(MockState::default());
        let provider: Arc<dyn SessionProvider> = Arc::new(MockProvider::new(state.clone()));
        let dir = tempfile::tempdir().unwrap();

        let mut cameras: Vec<CameraSpec> = (0..5)
            .map(|i| render_spec(&format!("Cam {i}"), &format!("id{i}")))
            .collect();
        cameras.push(CameraSpec {
            name: "Cobano Skyline".to_string(),
            page_url: "https://example.com/cobano".to_string(),
            base_url: None,
            image_id: None,
            strategy: CaptureStrategy::InteractiveRender,
        });

        let reports = capture_all(
            provider,
            &cameras,
            dir.path(),
            Duration::from_secs(240),
        )
        .await;

        assert_eq!(reports.len(), 6);
        assert!(reports.iter().all(|r| r.outcome.is_ok()));
    }
}
