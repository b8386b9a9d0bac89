use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

use crate::model::Coordinates;

/// Environment variable overriding the configured API credential.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

fn default_language() -> String {
    "en".to_string()
}

/// Fixed position used when no live geolocation capability exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HomePosition {
    pub latitude: f64,
    pub longitude: f64,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Weather API credential. `OPENWEATHER_API_KEY` takes precedence.
    pub api_key: Option<String>,

    /// Language code for provider condition descriptions.
    #[serde(default = "default_language")]
    pub language: String,

    /// Example TOML:
    /// [home]
    /// latitude = 37.57
    /// longitude = 126.98
    pub home: Option<HomePosition>,
}

impl Default for Config {
    fn default() -> Self {
        Self { api_key: None, language: default_language(), home: None }
    }
}

impl Config {
    /// Load config from disk (empty default on first run), then apply the
    /// environment credential override.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(key) = env::var(API_KEY_ENV) {
            if !key.is_empty() {
                cfg.api_key = Some(key);
            }
        }

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn set_home(&mut self, coords: Coordinates) {
        self.home = Some(HomePosition { latitude: coords.latitude, longitude: coords.longitude });
    }

    pub fn home_coordinates(&self) -> Option<Coordinates> {
        self.home.map(|h| Coordinates { latitude: h.latitude, longitude: h.longitude })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
