pub mod config;

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

pub use config::{Config, ConfigStorage, GeneralConfig, TomlConfigStorage, WatchConfig};

/// File name of the configuration inside the config directory
pub const CONFIG_FILE: &str = "crossclip.toml";

/// Resolve the config directory without creating it
///
/// XDG Base Directory Specification:
/// - Config: $XDG_CONFIG_HOME/crossclip (default: ~/.config/crossclip)
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Ok(PathBuf::from(xdg_config).join("crossclip"));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("crossclip"))
}

/// Ensure the config directory exists and return it
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory {:?}", dir))?;
    log::debug!("Config directory: {:?}", dir);
    Ok(dir)
}

/// Storage for the default config file location
pub fn default_config_storage() -> Result<TomlConfigStorage> {
    Ok(TomlConfigStorage::new(ensure_config_dir()?.join(CONFIG_FILE)))
}
