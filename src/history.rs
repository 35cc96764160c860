use crate::observation::RawObservation;
use crate::storage_utils::{AsyncStorageManager, HistoryConfig};
use anyhow::{Result, anyhow, bail};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

pub const HISTORY_FILE: &str = "history";

#[derive(Deserialize, Debug)]
struct HistoryEnvelope {
    status: String,
    #[serde(default)]
    data: Option<HistoryData>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct HistoryData {
    #[serde(default)]
    history: Vec<RawObservation>,
}

/// Periods look like `24h`, `7d`, `30d`, `1y`.
pub fn validate_period(period: &str) -> Result<()> {
    let re = Regex::new(r"^\d+[hdy]$")?;
    if !re.is_match(period) {
        bail!("invalid history period {:?}, expected something like 24h, 30d or 1y", period);
    }
    Ok(())
}

pub fn history_url(config: &HistoryConfig) -> Result<String> {
    validate_period(&config.period)?;
    Ok(format!(
        "{}/coin/{}/history/{}",
        config.base_url.trim_end_matches('/'),
        config.coin_id,
        config.period
    ))
}

/// Unwraps the `{status, data: {history}}` envelope.
fn into_history(envelope: HistoryEnvelope) -> Result<Vec<RawObservation>> {
    if envelope.status != "success" {
        return Err(anyhow!(
            "history request failed: {} ({})",
            envelope.message.unwrap_or_else(|| "no message".to_string()),
            envelope.kind.unwrap_or_else(|| envelope.status.clone()),
        ));
    }
    envelope
        .data
        .map(|d| d.history)
        .ok_or_else(|| anyhow!("history response has no data section"))
}

pub async fn fetch_history(client: &Client, config: &HistoryConfig) -> Result<Vec<RawObservation>> {
    let url = history_url(config)?;
    info!(%url, "fetching price history");

    let response = client.get(&url).send().await?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        warn!(?retry_after, "rate limited by history endpoint");
        bail!("rate limited by history endpoint, retry after {:?}", retry_after);
    }

    // Error bodies still carry the JSON envelope, so try that before giving up on status.
    let body = response.bytes().await?;
    match serde_json::from_slice::<HistoryEnvelope>(&body) {
        Ok(envelope) => into_history(envelope),
        Err(e) if !status.is_success() => Err(anyhow!("history request failed with {}: {}", status, e)),
        Err(e) => Err(e.into()),
    }
}

/// Fetches the configured history and stores it verbatim as `history.json`.
/// In offline mode the cached file is kept as it is.
pub async fn run(config: &HistoryConfig, storage: &AsyncStorageManager) -> Result<usize> {
    if config.offline {
        if !storage.exists(HISTORY_FILE) {
            bail!("offline mode but no cached history in {:?}", storage.base_dir);
        }
        let cached: Vec<RawObservation> = storage.load(HISTORY_FILE).await?;
        info!(points = cached.len(), "offline, using cached history");
        return Ok(cached.len());
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    let history = fetch_history(&client, config).await?;

    let path = storage.save(HISTORY_FILE, &history).await?;
    info!(points = history.len(), path = %path.display(), "history saved");
    Ok(history.len())
}
