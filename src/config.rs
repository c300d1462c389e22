//! Client configuration: API endpoint and transfer timing

use crate::error::{TransferError, TransferResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Interval between export-progress requests (3 s)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
/// Pause between the last status write and the artifact fetch pass (1 s)
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;
/// Below this viewport width the tray is never shown
pub const DEFAULT_TRAY_MIN_WIDTH: u32 = 768;

const ENV_BASE_URL: &str = "FILETRAY_BASE_URL";
const ENV_TOKEN: &str = "FILETRAY_TOKEN";
const ENV_DOWNLOAD_DIR: &str = "FILETRAY_DOWNLOAD_DIR";

/// What the upload sequencer does with the rest of a pass after an item fails.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadFailurePolicy {
    /// Mark the item failed and move on to the next one.
    #[default]
    Continue,
    /// Mark the item failed and stop the pass.
    Halt,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub tray_min_width: u32,
    pub failure_policy: UploadFailurePolicy,
    pub download_dir: PathBuf,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            tray_min_width: DEFAULT_TRAY_MIN_WIDTH,
            failure_policy: UploadFailurePolicy::default(),
            download_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub transfer: TransferConfig,
}

/// Raw configuration as read from a JSON file; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInput {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub tray_min_width: Option<u32>,
    pub failure_policy: Option<UploadFailurePolicy>,
    pub download_dir: Option<String>,
}

impl ConfigInput {
    /// Read a JSON config file.
    pub async fn from_file(path: &Path) -> TransferResult<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            TransferError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Apply `FILETRAY_*` environment overrides.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = Some(url);
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.token = Some(token);
        }
        if let Some(dir) = lookup(ENV_DOWNLOAD_DIR) {
            self.download_dir = Some(dir);
        }
        self
    }
}

/// Validate raw input into a usable [`Config`].
pub fn build_config(input: ConfigInput) -> TransferResult<Config> {
    let base_url = input
        .base_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| TransferError::Config("base URL is required".to_string()))?;
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(TransferError::Config(format!(
            "base URL must be http(s): {}",
            base_url
        )));
    }

    let poll_interval_ms = input.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
    if poll_interval_ms == 0 {
        return Err(TransferError::Config(
            "poll interval must be greater than zero".to_string(),
        ));
    }

    Ok(Config {
        api: ApiConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: input.token.filter(|t| !t.is_empty()),
        },
        transfer: TransferConfig {
            poll_interval: Duration::from_millis(poll_interval_ms),
            settle_delay: Duration::from_millis(
                input.settle_delay_ms.unwrap_or(DEFAULT_SETTLE_DELAY_MS),
            ),
            tray_min_width: input.tray_min_width.unwrap_or(DEFAULT_TRAY_MIN_WIDTH),
            failure_policy: input.failure_policy.unwrap_or_default(),
            download_dir: input
                .download_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        },
    })
}
