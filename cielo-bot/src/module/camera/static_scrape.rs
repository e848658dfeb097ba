//! Static scrape strategy: fetch the page, locate the image element,
//! download its source. Pure blocking I/O, so the whole capture runs on
//! the worker pool and never stalls the cooperative lane.

use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::{CameraSpec, CaptureError, sanitized_filename};

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);
const USER_AGENT: &str = "Mozilla/5.0 cielo-bot/0.1";

pub async fn capture(camera: &CameraSpec, out_dir: &Path) -> Result<PathBuf, CaptureError> {
    tracing::info!("📡 Processing static camera: {}", camera.name);
    let camera = camera.clone();
    let out_dir = out_dir.to_path_buf();
    tokio::task::spawn_blocking(move || fetch_image(&camera, &out_dir))
        .await
        .map_err(|e| CaptureError::Aborted(e.to_string()))?
}

fn fetch_image(camera: &CameraSpec, out_dir: &Path) -> Result<PathBuf, CaptureError> {
    let selector = camera
        .image_selector()
        .ok_or_else(|| CaptureError::MissingElement("<no image id configured>".to_string()))?;

    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?;

    let html = client
        .get(&camera.page_url)
        .send()?
        .error_for_status()?
        .text()?;

    let src = find_image_src(&html, &selector)
        .ok_or_else(|| CaptureError::MissingElement(selector.clone()))?;

    let base = camera.base_url.as_deref().unwrap_or(&camera.page_url);
    let image_url = Url::parse(base)?.join(&src)?;

    let bytes = client
        .get(image_url.as_str())
        .send()?
        .error_for_status()?
        .bytes()?;

    // An empty body is a failed capture; never leave a zero-byte file behind.
    if bytes.is_empty() {
        return Err(CaptureError::EmptyPayload);
    }

    let path = out_dir.join(sanitized_filename(&camera.name, "jpg"));
    std::fs::write(&path, &bytes)?;
    tracing::info!("Image '{}' saved ({} bytes).", camera.name, bytes.len());
    Ok(path)
}

fn find_image_src(html: &str, selector: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()?
        .value()
        .attr("src")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::camera::CaptureStrategy;

    fn spec(page_url: String, base_url: Option<String>) -> CameraSpec {
        CameraSpec {
            name: "Test Cam".to_string(),
            page_url,
            base_url,
            image_id: Some("liveImage".to_string()),
            strategy: CaptureStrategy::StaticScrape,
        }
    }

    #[test]
    fn test_find_image_src() {
        let html = r#"<html><body><img id="liveImage" src="/latest.jpg"></body></html>"#;
        assert_eq!(
            find_image_src(html, "img#liveImage").as_deref(),
            Some("/latest.jpg")
        );
        assert_eq!(find_image_src(html, "img#other"), None);
    }

    #[tokio::test]
    async fn test_capture_downloads_and_persists() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("GET", "/")
            .with_body(r#"<img id="liveImage" src="/cam/latest.jpg">"#)
            .create_async()
            .await;
        let image = server
            .mock("GET", "/cam/latest.jpg")
            .with_body(b"jpegdata".as_slice())
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let camera = spec(format!("{}/", server.url()), None);
        let path = capture(&camera, dir.path()).await.unwrap();

        assert_eq!(path.file_name().unwrap(), "test_cam.jpg");
        assert_eq!(std::fs::read(&path).unwrap(), b"jpegdata");
        page.assert_async().await;
        image.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected_without_writing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_body(r#"<img id="liveImage" src="/cam/latest.jpg">"#)
            .create_async()
            .await;
        server
            .mock("GET", "/cam/latest.jpg")
            .with_body(b"".as_slice())
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let camera = spec(format!("{}/", server.url()), None);
        let result = capture(&camera, dir.path()).await;

        assert!(matches!(result, Err(CaptureError::EmptyPayload)));
        assert!(!dir.path().join("test_cam.jpg").exists());
    }

    #[tokio::test]
    async fn test_missing_element_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_body("<html><body>no camera here</body></html>")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let camera = spec(format!("{}/", server.url()), None);
        let result = capture(&camera, dir.path()).await;

        assert!(matches!(result, Err(CaptureError::MissingElement(_))));
    }
}
