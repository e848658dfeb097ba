use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserlessConfig {
    /// WebSocket endpoint of the remote browser provider,
    /// e.g. "wss://chrome.browserless.io"
    pub endpoint: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    pub browserless: BrowserlessConfig,

    /// Upper bound for a single render-strategy capture. The deployed
    /// variants of this bot have used both 180 and 240 seconds; treat it
    /// as a tunable rather than a constant.
    #[serde(default = "default_render_timeout_secs")]
    pub render_timeout_secs: u64,

    /// Delay between consecutive media sends to stay under chat rate limits.
    #[serde(default = "default_media_pacing_secs")]
    pub media_pacing_secs: u64,

    #[serde(default = "default_webcam_output_dir")]
    pub webcam_output_dir: String,

    #[serde(default = "default_satellite_output_dir")]
    pub satellite_output_dir: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_render_timeout_secs() -> u64 {
    240
}

fn default_media_pacing_secs() -> u64 {
    1
}

fn default_webcam_output_dir() -> String {
    "output_webcams".to_string()
}

fn default_satellite_output_dir() -> String {
    "output_satellite".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl BotConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn media_pacing(&self) -> Duration {
        Duration::from_secs(self.media_pacing_secs)
    }
}

pub static CONFIG: OnceLock<BotConfig> = OnceLock::new();

pub fn parse_config(content: &str) -> anyhow::Result<BotConfig> {
    let config: BotConfig = toml::from_str(content).context("Failed to parse configuration")?;
    Ok(config)
}

pub fn read_config(path: &str) -> anyhow::Result<&'static BotConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {path}"))?;
    let config = parse_config(&content)
        .with_context(|| format!("Config file {path} is invalid or incomplete"))?;
    Ok(CONFIG.get_or_init(|| config))
}
