// ABOUTME: Loads client configuration from ~/.wb-tracker/config.toml or --config
// ABOUTME: Merges file values with CLI/env overrides and builds polling/detector settings

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::DEFAULT_API_URL;
use crate::sync::{FieldRules, PollingConfig};

const CONFIG_DIR: &str = ".wb-tracker";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub telegram_id: Option<i64>,
    pub polling: PollingSection,
    pub detector: DetectorSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingSection {
    pub interval_ms: u64,
    pub min_update_interval_ms: u64,
    pub focus_threshold_ms: u64,
    pub enabled: bool,
}

impl Default for PollingSection {
    fn default() -> Self {
        let defaults = PollingConfig::default();
        Self {
            interval_ms: defaults.interval.as_millis() as u64,
            min_update_interval_ms: defaults.min_update_interval.as_millis() as u64,
            focus_threshold_ms: defaults.focus_threshold.as_millis() as u64,
            enabled: defaults.enabled,
        }
    }
}

impl From<&PollingSection> for PollingConfig {
    fn from(section: &PollingSection) -> Self {
        PollingConfig {
            interval: Duration::from_millis(section.interval_ms),
            min_update_interval: Duration::from_millis(section.min_update_interval_ms),
            focus_threshold: Duration::from_millis(section.focus_threshold_ms),
            enabled: section.enabled,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorSection {
    pub items: FieldRules,
    pub profile: FieldRules,
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            items: FieldRules::items(),
            profile: FieldRules::profile(),
        }
    }
}

/// Resolved configuration used by the commands.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub telegram_id: Option<i64>,
    pub polling: PollingConfig,
    pub items_rules: FieldRules,
    pub profile_rules: FieldRules,
}

impl AppConfig {
    pub fn from_file(file: FileConfig) -> Self {
        Self {
            api_url: file.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            telegram_id: file.telegram_id,
            polling: PollingConfig::from(&file.polling),
            items_rules: file.detector.items,
            profile_rules: file.detector.profile,
        }
    }

    /// Apply CLI/env overrides on top of the file values.
    pub fn with_overrides(mut self, api_url: Option<String>, telegram_id: Option<i64>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if telegram_id.is_some() {
            self.telegram_id = telegram_id;
        }
        self
    }

    pub fn require_telegram_id(&self) -> Result<i64> {
        self.telegram_id.ok_or_else(|| {
            anyhow::anyhow!(
                "Telegram id not provided. Use `--telegram-id`, WB_TRACKER_TELEGRAM_ID, or set telegram_id in the config file."
            )
        })
    }
}

/// Default config location: ~/.wb-tracker/config.toml
pub fn default_config_path() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(home_dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn parse(contents: &str) -> Result<FileConfig> {
    toml::from_str(contents).context("Failed to parse configuration")
}

pub fn load_from_file(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    parse(&contents).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Load the explicit config file, or the default one when it exists.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
    let file = match explicit {
        Some(path) => load_from_file(path)?,
        None => {
            let path = default_config_path()?;
            if path.exists() {
                tracing::debug!("Loading configuration from {:?}", path);
                load_from_file(&path)?
            } else {
                FileConfig::default()
            }
        }
    };

    let config = AppConfig::from_file(file);
    config
        .polling
        .validate()
        .context("Invalid [polling] configuration")?;
    Ok(config)
}
