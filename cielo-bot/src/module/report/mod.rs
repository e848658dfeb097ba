//! Airport weather report: fetch raw METAR observations and format the
//! text message that heads every delivery.

use anyhow::Context;
use chrono::{FixedOffset, Utc};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://aviationweather.gov/api/data/metar";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct StationSpec {
    pub icao: String,
    pub display_name: String,
}

impl StationSpec {
    pub fn new(icao: &str, display_name: &str) -> Self {
        Self {
            icao: icao.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetarRecord {
    #[serde(rename = "icaoId")]
    icao_id: Option<String>,
    #[serde(rename = "rawOb")]
    raw_ob: Option<String>,
}

pub struct ReportAggregator {
    api_url: String,
    client: reqwest::Client,
}

impl Default for ReportAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::with_api_url(DEFAULT_API_URL)
    }

    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build the headline report. Always returns a usable message: when
    /// the METAR endpoint is unreachable the header survives with a
    /// degradation notice appended.
    pub async fn fetch_report(&self, stations: &[StationSpec]) -> String {
        tracing::info!("Obtaining METAR reports.");

        let local = Utc::now().with_timezone(&costa_rica_offset());
        let mut report = format!(
            "*Reporte Meteorológico de Aeropuertos*\n_{}_\n{}\n\n",
            local.format("%Y-%m-%d %I:%M %p %Z"),
            "-".repeat(30)
        );

        match self.fetch_records(stations).await {
            Ok(records) => {
                for record in records {
                    let icao = record.icao_id.as_deref().unwrap_or("N/A");
                    let raw = record.raw_ob.as_deref().unwrap_or("No disponible");
                    let name = stations
                        .iter()
                        .find(|s| s.icao == icao)
                        .map(|s| s.display_name.as_str())
                        .unwrap_or("");
                    report.push_str(&format!("*{icao} ({name})*:\n`{raw}`\n\n"));
                }
                tracing::info!("METAR reports obtained.");
            }
            Err(e) => {
                tracing::error!("Error obtaining METAR data: {:#}", e);
                report.push_str("No se pudieron obtener los datos meteorológicos.");
            }
        }
        report
    }

    async fn fetch_records(&self, stations: &[StationSpec]) -> anyhow::Result<Vec<MetarRecord>> {
        let ids: Vec<&str> = stations.iter().map(|s| s.icao.as_str()).collect();
        let url = format!("{}?ids={}&format=json", self.api_url, ids.join(","));

        let records = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("METAR request failed")?
            .error_for_status()
            .context("METAR endpoint returned an error status")?
            .json::<Vec<MetarRecord>>()
            .await
            .context("METAR response was not valid JSON")?;
        Ok(records)
    }
}

// UTC-6, no DST.
fn costa_rica_offset() -> FixedOffset {
    FixedOffset::west_opt(6 * 3600).expect("constant offset is in range")
}
