use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Widget options, read once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub backend_url: String,
    /// Poll interval in milliseconds.
    pub update_interval: u64,
    /// Fade duration for a new frame, in milliseconds.
    pub animation_speed: u64,
    pub max_assignments: usize,
    /// Accepted for compatibility; rendering always shows progress.
    pub show_progress: bool,
    /// Accepted for compatibility; dates are always shown as DD.MM.YYYY.
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:5000".into(),
            update_interval: 5 * 60 * 1000,
            animation_speed: 500,
            max_assignments: 10,
            show_progress: true,
            date_format: "DD.MM.YYYY".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config at {}", path.display()))?;
                toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?
            }
            _ => Config::default(),
        };

        if let Ok(url) = std::env::var("UNI_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Ok(interval) = std::env::var("UNI_UPDATE_INTERVAL") {
            config.update_interval = interval
                .parse()
                .with_context(|| format!("UNI_UPDATE_INTERVAL is not a number: {interval}"))?;
        }

        if config.update_interval == 0 {
            anyhow::bail!("updateInterval must be greater than zero");
        }

        Ok(config)
    }

    pub fn generate_default() -> Result<PathBuf> {
        let path = Self::config_path().with_context(|| "Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(&Config::default())?;
        std::fs::write(&path, toml_str)?;
        Ok(path)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval)
    }

    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_speed)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("uni-mirror").join("config.toml"))
    }
}
