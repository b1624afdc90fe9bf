use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::Coordinates;

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Used when neither the environment nor the config file provide a key.
pub const FALLBACK_API_KEY: &str = "e9b08b0edfd25583d29d6d1dbc92957f";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_GEO_BASE_URL: &str = "https://api.openweathermap.org/geo/1.0";
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// search_debounce_ms = 300
///
/// [default_location]
/// latitude = 52.52
/// longitude = 13.405
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,

    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Answered in place of a platform position when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_location: Option<Coordinates>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_geo_base_url() -> String {
    DEFAULT_GEO_BASE_URL.to_string()
}

const fn default_search_debounce_ms() -> u64 {
    DEFAULT_SEARCH_DEBOUNCE_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            geo_base_url: default_geo_base_url(),
            search_debounce_ms: default_search_debounce_ms(),
            default_location: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from the environment, then the config file, then the built-in fallback.
    pub fn resolve_api_key(&self) -> String {
        self.resolve_api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key_with(&self, env_key: Option<String>) -> String {
        if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
            return key;
        }

        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return key.to_string();
        }

        tracing::warn!(
            "No API key configured (set {API_KEY_ENV} or run `weather-dashboard configure`); \
             using the built-in fallback key"
        );
        FALLBACK_API_KEY.to_string()
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn set_default_location(&mut self, location: Option<Coordinates>) {
        self.default_location = location;
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
