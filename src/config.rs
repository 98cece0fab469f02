use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::RoundwatchError;
use crate::metrics::{DEFAULT_MISSING_LOCATION_LABEL, DerivationOptions};

const CONFIG_DIR_NAME: &str = "roundwatch";
const CONFIG_FILE_NAME: &str = "config.json";
pub const REFRESH_RATE_MS: u64 = 1000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// How often `watch` re-reads the round file
    pub refresh_rate_ms: u64,
    pub missing_location_label: String,
    /// Print the event timeline along with the metrics
    pub show_timeline: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: REFRESH_RATE_MS,
            missing_location_label: DEFAULT_MISSING_LOCATION_LABEL.to_string(),
            show_timeline: false,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_local_file() -> Option<Self> {
        let config_path = Self::default_path()?;
        match Self::from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {:?}: {}", config_path, e);
                None
            }
        }
    }

    pub fn from_file(config_path: &Path) -> Result<Option<Self>, RoundwatchError> {
        if !config_path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(config_path)
            .map_err(|e| RoundwatchError::ConfigIOError { source: e })?;
        serde_json::from_reader(file)
            .map(Some)
            .map_err(|e| RoundwatchError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), RoundwatchError> {
        let config_path = Self::default_path().ok_or(RoundwatchError::NoConfigDir)?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), RoundwatchError> {
        if let Some(parent) = config_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| RoundwatchError::ConfigIOError { source: e })?;
            }
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| RoundwatchError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| RoundwatchError::ConfigSerializeError { source: e })
    }

    pub fn derivation_options(&self) -> DerivationOptions {
        DerivationOptions {
            missing_location_label: self.missing_location_label.clone(),
        }
    }
}
