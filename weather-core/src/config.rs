use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::provider::tomorrow::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Host probed to decide whether the machine is online.
pub const DEFAULT_PROBE_HOST: &str = "api.tomorrow.io:443";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// cache_dir = "/home/me/.cache/weather"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Tomorrow.io API key.
    pub api_key: Option<String>,

    /// Provider base URL; defaults to the public Tomorrow.io endpoint.
    pub base_url: Option<String>,

    /// Where cached weather is kept; defaults to the platform cache dir.
    pub cache_dir: Option<PathBuf>,

    pub timeout_secs: Option<u64>,

    /// `host:port` used by the reachability probe.
    pub probe_host: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    /// `WEATHER_API_KEY` takes precedence over the stored key.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;

        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            cfg.api_key = Some(key.trim().to_string());
        }

        Ok(cfg)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
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

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Platform cache dir used when no `cache_dir` is configured.
    pub fn default_cache_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.cache_dir().to_path_buf())
    }

    /// Configured cache directory, or the platform cache dir.
    pub fn resolved_cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_cache_dir(),
        }
    }

    /// Store `dir` as the cache directory. The platform default is stored as
    /// unset so the config keeps following it.
    pub fn set_cache_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.cache_dir = (dir != Self::default_cache_dir()?).then_some(dir);
        Ok(())
    }

    /// API key, if one is configured.
    pub fn api_key(&self) -> Result<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `weather configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn probe_host(&self) -> &str {
        self.probe_host.as_deref().unwrap_or(DEFAULT_PROBE_HOST)
    }
}
