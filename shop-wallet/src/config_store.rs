use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use blake3::Hasher as Blake3;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::MobileType;
use crate::errors::{WalletError, WalletResult};

const CONFIG_VERSION: u16 = 1;

const ENV_ENDPOINT: &str = "SHOP_ENDPOINT";
const ENV_REQUEST_TIMEOUT: &str = "SHOP_REQUEST_TIMEOUT";
const ENV_HISTORY_PAGE_SIZE: &str = "SHOP_HISTORY_PAGE_SIZE";
const ENV_LANGUAGE: &str = "SHOP_LANGUAGE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub endpoint: String,
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8545".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryConfig {
    pub page_size: u32,
    pub sort_by: String,
    pub sort_direction: SortDirection,
    pub amount_decimals: u8,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            sort_by: "blockNumber".to_string(),
            sort_direction: SortDirection::Desc,
            amount_decimals: 9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushConfig {
    pub language: String,
    pub app_type: MobileType,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            language: "kr".to_string(),
            app_type: MobileType::ShopApp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub history: HistoryConfig,
    pub push: PushConfig,
    pub environment: String,
    pub last_updated: DateTime<Utc>,
    pub version: u16,
}

impl AppConfig {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            network: NetworkConfig::default(),
            history: HistoryConfig::default(),
            push: PushConfig::default(),
            environment: environment.into(),
            last_updated: Utc::now(),
            version: CONFIG_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    /// Apply `SHOP_*` environment variables on top of the stored values.
    pub fn apply_env_overrides(&mut self) -> WalletResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> WalletResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in [
            ENV_ENDPOINT,
            ENV_REQUEST_TIMEOUT,
            ENV_HISTORY_PAGE_SIZE,
            ENV_LANGUAGE,
        ] {
            let Some(value) = lookup(key) else {
                continue;
            };
            if value.trim().is_empty() {
                log::warn!("Environment variable {} is empty", key);
                continue;
            }
            if value.chars().any(|c| c.is_control()) {
                log::warn!(
                    "Environment variable {} contains control characters, ignoring",
                    key
                );
                continue;
            }

            let value = value.trim();
            match key {
                ENV_ENDPOINT => {
                    self.network.endpoint = value.trim_end_matches('/').to_string();
                }
                ENV_REQUEST_TIMEOUT => {
                    self.network.request_timeout_secs = parse_number(value, key)?;
                }
                ENV_HISTORY_PAGE_SIZE => {
                    self.history.page_size = parse_number(value, key)?;
                }
                ENV_LANGUAGE => self.push.language = value.to_string(),
                _ => {}
            }
            log::debug!("Loaded configuration from environment variable {}", key);
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, key: &str) -> WalletResult<T> {
    value.parse().map_err(|_| {
        WalletError::ValidationError(format!(
            "Invalid numeric value '{}' for configuration key '{}'",
            value, key
        ))
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigEnvelope {
    version: u16,
    checksum: [u8; 32],
    payload: AppConfig,
    modified_at_unix: i64,
}

/// Handles persistence of app configuration with integrity checks.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load_or_default(&self, environment: impl Into<String>) -> WalletResult<AppConfig> {
        if !self.path.exists() {
            let config = AppConfig::new(environment);
            self.save(&config)?;
            return Ok(config);
        }

        let bytes = fs::read(&self.path)?;
        let envelope: ConfigEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version != CONFIG_VERSION {
            return Err(WalletError::ValidationError(format!(
                "Unsupported config version {}",
                envelope.version
            )));
        }

        if checksum(&envelope.payload)? != envelope.checksum {
            return Err(WalletError::ValidationError(
                "Config integrity verification failed".to_string(),
            ));
        }

        Ok(envelope.payload)
    }

    pub fn save(&self, config: &AppConfig) -> WalletResult<()> {
        let mut payload = config.clone();
        payload.touch();

        let envelope = ConfigEnvelope {
            version: CONFIG_VERSION,
            checksum: checksum(&payload)?,
            modified_at_unix: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map_err(|e| WalletError::StorageError(e.to_string()))?
                .as_secs() as i64,
            payload,
        };

        let serialized = serde_json::to_vec_pretty(&envelope)?;
        let tmp_path = self.path.with_extension("new");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&serialized)?;
            file.sync_all()?;
        }
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }

    pub fn update<F>(&self, environment: impl Into<String>, updater: F) -> WalletResult<AppConfig>
    where
        F: FnOnce(&mut AppConfig) -> WalletResult<()>,
    {
        let mut config = self.load_or_default(environment)?;
        updater(&mut config)?;
        config.touch();
        self.save(&config)?;
        Ok(config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn checksum(config: &AppConfig) -> WalletResult<[u8; 32]> {
    let mut hasher = Blake3::new();
    let encoded = serde_json::to_vec(config)?;
    hasher.update(&encoded);
    let mut output = [0u8; 32];
    output.copy_from_slice(hasher.finalize().as_bytes());
    Ok(output)
}
