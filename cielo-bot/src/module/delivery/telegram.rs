//! Telegram Bot API messenger over plain HTTPS multipart uploads.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

use super::{DeliveryError, MediaPhoto, Messenger};

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
/// Matches the upload read/write budget the channel tolerates.
const SEND_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

pub struct TelegramClient {
    base_url: String,
    token: String,
    chat_id: i64,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(token: &str, chat_id: i64) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, token, chat_id)
    }

    pub fn with_base_url(base_url: &str, token: &str, chat_id: i64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn check(&self, response: reqwest::Response) -> Result<(), DeliveryError> {
        let parsed = response.json::<ApiResponse>().await?;
        if parsed.ok {
            Ok(())
        } else {
            Err(DeliveryError::Api(
                parsed
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            ))
        }
    }

    async fn file_part(path: &Path) -> Result<Part, DeliveryError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Part::bytes(bytes).file_name(file_name))
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.endpoint("sendMessage"))
            .timeout(SEND_TIMEOUT)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await?;
        self.check(response).await
    }

    async fn send_media_group(&self, photos: &[MediaPhoto]) -> Result<(), DeliveryError> {
        // Each photo is uploaded as its own multipart file and referenced
        // from the media description via attach://.
        let media: Vec<serde_json::Value> = photos
            .iter()
            .enumerate()
            .map(|(i, photo)| {
                json!({
                    "type": "photo",
                    "media": format!("attach://photo{i}"),
                    "caption": photo.caption,
                })
            })
            .collect();

        let mut form = Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("media", serde_json::Value::Array(media).to_string());
        for (i, photo) in photos.iter().enumerate() {
            form = form.part(format!("photo{i}"), Self::file_part(&photo.path).await?);
        }

        let response = self
            .client
            .post(self.endpoint("sendMediaGroup"))
            .timeout(SEND_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        self.check(response).await
    }

    async fn send_video(&self, video: &Path, caption: &str) -> Result<(), DeliveryError> {
        let form = Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("caption", caption.to_string())
            .text("supports_streaming", "true")
            .part("video", Self::file_part(video).await?);

        let response = self
            .client
            .post(self.endpoint("sendVideo"))
            .timeout(SEND_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        self.check(response).await
    }
}
