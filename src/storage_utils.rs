use chrono::Local;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

// CONFIGURATION STRUCTS

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub base_url: String,
    pub coin_id: u32,       // e.g., 1 for Bitcoin
    pub period: String,     // e.g., "24h", "7d", "30d", "1y"
    pub timeout_secs: u64,
    pub offline: bool,      // reuse storage/history.json instead of fetching
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coinranking.com/v1/public".to_string(),
            coin_id: 1,
            period: "30d".to_string(),
            timeout_secs: 10,
            offline: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stable sort by timestamp before enrichment. Off by default so that
    /// "previous row" means previous in the order the API returned.
    pub sort_by_timestamp: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Table,
    Json,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub display: DisplayMode,
    pub table_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            display: DisplayMode::Table,
            table_rows: 31,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub history: HistoryConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

// STORAGE MANAGER

pub struct AsyncStorageManager {
    // Absolute path to the storage directory (e.g., ".../target/debug/storage")
    pub base_dir: PathBuf,
}

impl AsyncStorageManager {
    /// Storage directory relative to the running executable, created if missing.
    pub async fn new_relative<P: AsRef<Path>>(relative_path: P) -> anyhow::Result<Self> {
        let exe_path = std::env::current_exe()?;

        let base_dir = exe_path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Could not find binary directory"))?
            .join(relative_path);

        Self::new(base_dir).await
    }

    pub async fn new<P: Into<PathBuf>>(base_dir: P) -> anyhow::Result<Self> {
        let base_dir = base_dir.into();
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir).await?;
        }
        Ok(Self { base_dir })
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", filename))
    }

    /// Serialises `data` to `<filename>.json`.
    /// Writes to a `.tmp` sibling first and renames it, so a crash mid-write
    /// never leaves a truncated file behind.
    pub async fn save<T: Serialize>(&self, filename: &str, data: &T) -> anyhow::Result<PathBuf> {
        let final_path = self.path_for(filename);
        let tmp_path = self.base_dir.join(format!("{}.json.tmp", filename));

        let json_bytes = serde_json::to_vec_pretty(data)?;

        fs::write(&tmp_path, json_bytes).await?;
        fs::rename(&tmp_path, &final_path).await?;

        debug!(path = %final_path.display(), "saved");
        Ok(final_path)
    }

    pub async fn load<T: DeserializeOwned>(&self, filename: &str) -> anyhow::Result<T> {
        // serde_json validates UTF-8 itself, so skip read_to_string
        let content = fs::read(self.path_for(filename)).await?;
        let data = serde_json::from_slice(&content)?;
        Ok(data)
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.path_for(filename).exists()
    }

    /// Loads the config, writing the defaults first if there is none yet.
    pub async fn load_or_init_config(&self) -> anyhow::Result<AppConfig> {
        if !self.exists("config") {
            let config = AppConfig::default();
            let path = self.save("config", &config).await?;
            info!(path = %path.display(), "no config found, wrote defaults");
            return Ok(config);
        }
        self.load("config").await
    }
}

/// Local wall-clock stamp used to name the output files of one run.
pub fn run_stamp() -> String {
    Local::now().format("%Y-%m-%d-%H-%M-%S").to_string()
}
