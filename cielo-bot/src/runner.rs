//! One full bot run: reset output dirs, gather the report and webcam
//! captures concurrently, deliver, then produce the satellite videos.

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::catalog;
use crate::config::BotConfig;
use crate::module::browser::cdp::BrowserlessProvider;
use crate::module::browser::SessionProvider;
use crate::module::camera::{scheduler, CameraSpec, CaptureReport};
use crate::module::delivery::{DeliveryBatcher, TelegramClient};
use crate::module::report::{ReportAggregator, StationSpec};
use crate::module::satellite::{FfmpegTranscoder, SatellitePipeline};

pub async fn run_once(config: &BotConfig) -> anyhow::Result<()> {
    let started = Instant::now();
    tracing::info!("================ BOT RUN STARTING ================");

    let webcam_dir = Path::new(&config.webcam_output_dir);
    let satellite_dir = Path::new(&config.satellite_output_dir);
    reset_output_dir(webcam_dir).await?;
    reset_output_dir(satellite_dir).await?;

    let messenger = TelegramClient::new(&config.telegram.token, config.telegram.chat_id);
    let batcher = DeliveryBatcher::new(&messenger, config.media_pacing());
    let provider: Arc<dyn SessionProvider> = Arc::new(BrowserlessProvider::new(
        &config.browserless.endpoint,
        &config.browserless.token,
    ));

    let aggregator = ReportAggregator::new();
    let stations = catalog::stations();
    let cameras = catalog::cameras();
    let (report_text, capture_reports) = gather_stage(
        &aggregator,
        provider.clone(),
        &stations,
        &cameras,
        webcam_dir,
        config.render_timeout(),
    )
    .await;

    batcher.deliver_report(&report_text, &capture_reports).await;

    let transcoder = FfmpegTranscoder;
    let pipeline = SatellitePipeline::new(
        catalog::SATELLITE_START_URL,
        satellite_dir,
        &transcoder,
        &batcher,
    );
    let videos = pipeline.run(provider.as_ref(), &catalog::satellite_maps()).await;
    tracing::info!("Satellite stage delivered {} videos.", videos);

    tracing::info!(
        "🎉 RUN COMPLETED in {:.2} seconds.",
        started.elapsed().as_secs_f64()
    );
    tracing::info!("================ BOT RUN FINISHED ================");
    Ok(())
}

/// Run the report fetch and the webcam fleet concurrently; neither side
/// can fail the join, both degrade per item. The station and camera
/// slices outlive both futures.
async fn gather_stage(
    aggregator: &ReportAggregator,
    provider: Arc<dyn SessionProvider>,
    stations: &[StationSpec],
    cameras: &[CameraSpec],
    webcam_dir: &Path,
    render_timeout: Duration,
) -> (String, Vec<CaptureReport>) {
    tokio::join!(
        aggregator.fetch_report(stations),
        scheduler::capture_all(provider, cameras, webcam_dir, render_timeout),
    )
}

/// Each run starts from an empty output directory so stale captures can
/// never be re-delivered.
async fn reset_output_dir(dir: &Path) -> anyhow::Result<()> {
    if tokio::fs::try_exists(dir).await.unwrap_or(false) {
        tokio::fs::remove_dir_all(dir)
            .await
            .with_context(|| format!("Failed to clear output dir {dir:?}"))?;
    }
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output dir {dir:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::browser::mock::{MockProvider, MockState};
    use crate::module::camera::CaptureStrategy;
    use std::time::Duration;

    #[tokio::test]
    async fn test_gather_stage_yields_report_and_all_captures() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"icaoId": "MROC", "rawOb": "MROC 241200Z 08006KT"}]"#)
            .create_async()
            .await;
        let aggregator =
            ReportAggregator::with_api_url(&format!("{}/api/data/metar", server.url()));

        let state = Arc::new(MockState::default());
        let provider: Arc<dyn SessionProvider> = Arc::new(MockProvider::new(state));
        let dir = tempfile::tempdir().unwrap();

        let stations = catalog::stations();
        let cameras: Vec<CameraSpec> = (0..3)
            .map(|i| CameraSpec {
                name: format!("Cam {i}"),
                page_url: format!("https://example.com/{i}"),
                base_url: None,
                image_id: Some(format!("id{i}")),
                strategy: CaptureStrategy::SimpleRender,
            })
            .collect();

        let (report, reports) = gather_stage(
            &aggregator,
            provider,
            &stations,
            &cameras,
            dir.path(),
            Duration::from_secs(240),
        )
        .await;

        assert!(report.starts_with("*Reporte Meteorológico de Aeropuertos*"));
        assert!(report.contains("MROC"));
        assert_eq!(reports.len(), cameras.len());
        assert!(reports.iter().all(|r| r.outcome.is_ok()));
    }

    #[tokio::test]
    async fn test_reset_output_dir_clears_previous_run() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("output_webcams");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.png"), b"old").unwrap();

        reset_output_dir(&dir).await.unwrap();

        assert!(dir.exists());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_reset_output_dir_creates_missing_dir() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("output_satellite");

        reset_output_dir(&dir).await.unwrap();
        assert!(dir.exists());

        // Idempotent on an already-fresh directory.
        reset_output_dir(&dir).await.unwrap();
        assert!(dir.exists());
    }
}
