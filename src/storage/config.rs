use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::platform::BackendKind;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// General configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Backend to use instead of detecting one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            backend: None,
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

/// Settings for `--watch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Milliseconds between clipboard polls
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_INTERVAL_MS))
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            interval_ms: default_interval_ms(),
        }
    }
}

const MIN_INTERVAL_MS: u64 = 50;

// Default value functions for serde
fn default_log_level() -> String {
    "warn".to_string()
}

fn default_interval_ms() -> u64 {
    500
}

/// Trait for configuration storage
pub trait ConfigStorage {
    /// Load configuration from file
    fn load(&self) -> Result<Config>;

    /// Save configuration to file
    fn save(&self, config: &Config) -> Result<()>;

    /// Get the config file path
    fn path(&self) -> &PathBuf;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            log::info!(
                "Config file not found at {:?}, creating default configuration",
                self.path
            );
            self.create_default()?;
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.path))?;

        log::debug!(
            "Loaded configuration from {:?}: backend={:?}, log_level={}",
            self.path,
            config.general.backend,
            config.general.log_level
        );

        Ok(config)
    }

    fn save(&self, config: &Config) -> Result<()> {
        let toml_str =
            toml::to_string_pretty(config).context("Failed to serialize configuration")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(&self.path, toml_str)
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;

        log::debug!("Saved configuration to {:?}", self.path);

        Ok(())
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Use the example config compiled into the binary
        let example_config = include_str!("../../crossclip.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::info!("Created default configuration at {:?}", self.path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("crossclip-test-{}-{}", std::process::id(), name))
            .join("crossclip.toml")
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.general.backend, None);
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.watch.interval_ms, 500);
    }

    #[test]
    fn test_example_config_parses_to_defaults() {
        let config: Config = toml::from_str(include_str!("../../crossclip.toml.example")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_backend_override() {
        let toml_str = r#"
        [general]
        backend = "appkit"
        log_file = "/tmp/crossclip.log"

        [watch]
        interval_ms = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.backend, Some(BackendKind::AppKit));
        assert_eq!(config.general.log_file, Some(PathBuf::from("/tmp/crossclip.log")));
        assert_eq!(config.watch.interval(), Duration::from_millis(MIN_INTERVAL_MS));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let toml_str = r#"
        [general]
        backend = "wayland"
        "#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_load_creates_default_then_round_trips() {
        let path = scratch_path("load");
        let _ = fs::remove_dir_all(path.parent().unwrap());
        let storage = TomlConfigStorage::new(path.clone());

        assert_eq!(storage.load().unwrap(), Config::default());
        assert!(path.exists());

        let mut config = Config::default();
        config.general.backend = Some(BackendKind::Qt);
        storage.save(&config).unwrap();
        assert_eq!(storage.load().unwrap(), config);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
