//! Host configuration
//!
//! One TOML file, by default `<config dir>/strata/config.toml`. Every section
//! is optional; anything missing takes its default value.
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [display]
//! width = 2560.0
//! height = 1440.0
//! pixel_ratio = 2.0
//!
//! [input.mapping]
//! jump = ["Space", "KeyJ"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::controller::CollectorSettings;
use crate::device::SafeAreaInsets;
use crate::input::InputMappingUpdate;

const CONFIG_DIR: &str = "strata";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct StrataConfig {
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
    pub input: InputConfig,
    pub pump: PumpConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Configured level, `INFO` if it doesn't parse
    pub fn tracing_level(&self) -> tracing::Level {
        self.level.parse().unwrap_or_else(|_| {
            warn!("Unknown log level '{}', using info", self.level);
            tracing::Level::INFO
        })
    }

    /// Filter directive for the subscriber; a non-empty `RUST_LOG` overrides the config
    pub fn filter_directive(&self, rust_log: Option<String>) -> String {
        match rust_log {
            Some(directive) if !directive.trim().is_empty() => directive,
            _ => self.tracing_level().to_string().to_lowercase(),
        }
    }
}

/// Display metrics for hosts that can't query them (desktop windows)
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
    pub safe_area: SafeAreaInsets,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            pixel_ratio: 1.0,
            safe_area: SafeAreaInsets::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// How often the host publishes an `inputChange` snapshot
    pub poll_interval_ms: u64,
    /// Applied on top of the built-in bindings at startup
    pub mapping: InputMappingUpdate,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 16,
            mapping: InputMappingUpdate::default(),
        }
    }
}

impl InputConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PumpConfig {
    pub idle_sleep_us: u64,
    pub stats_interval_secs: i64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        let settings = CollectorSettings::default();
        Self {
            idle_sleep_us: settings.idle_sleep.as_micros() as u64,
            stats_interval_secs: settings.stats_interval_secs,
        }
    }
}

impl PumpConfig {
    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            idle_sleep: Duration::from_micros(self.idle_sleep_us),
            stats_interval_secs: self.stats_interval_secs,
        }
    }
}

impl StrataConfig {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    /// Reads `path`, or returns the defaults if the file doesn't exist
    pub async fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| ConfigError::io(path, e))?;
        if !exists {
            warn!("Config file {} does not exist, using default", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::io(path, e))?;
        let config: Self = toml::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::io(parent, e))?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| ConfigError::io(path, e))?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }
}

/// Writes a default config file at `path` unless one is already there
pub async fn ensure_default_config(path: &Path) -> Result<(), ConfigError> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| ConfigError::io(path, e))?;
    if !exists {
        info!("Creating default configuration at {}", path.display());
        StrataConfig::default().save(path).await?;
    }
    Ok(())
}
