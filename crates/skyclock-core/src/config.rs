//! Application configuration.
//!
//! Loaded from `config.json` in the platform config directory; every field
//! has a default so a missing file just means defaults.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Application configuration directory
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// External service endpoints and credentials
    #[serde(default)]
    pub services: ServiceConfig,

    /// Device position settings
    #[serde(default)]
    pub device: DeviceConfig,
}

/// External service settings. Base URLs are only set to override the
/// built-in endpoints (tests point them at a local mock server).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocode_base_url: Option<String>,

    /// OpenCage API key for reverse geocoding. Without it the location
    /// label simply stays unresolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocode_api_key: Option<String>,
}

/// Where "device position" comes from on a headless system: a fixed
/// configured coordinate pair. Absent means geolocation is unavailable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct DeviceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("skyclock"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Load the configuration, falling back to defaults when no file exists.
    ///
    /// # Errors
    /// Fails when an existing config file cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let dir = default_config_dir();
        let path = dir.join("config.json");

        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self {
                config_dir: dir,
                ..Self::default()
            });
        }

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let mut config: Self =
            serde_json::from_str(&json).context("Failed to parse config file")?;
        config.config_dir = dir;
        Ok(config)
    }

    /// Write the configuration back to disk.
    ///
    /// # Errors
    /// Fails when the config directory or file cannot be written.
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir).context("Failed to create config directory")?;
        let path = self.config_dir.join("config.json");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    /// Path of the local key-value state file (cache, selection, preferences).
    pub fn state_path(&self) -> PathBuf {
        self.config_dir.join("state.json")
    }
}
