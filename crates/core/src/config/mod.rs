//! Configuration module for modkeeper
//!
//! This module provides configuration structures and loading mechanisms.
//! Configuration can be loaded from TOML files and/or environment variables.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use defaults::*;

pub use defaults::{DEFAULT_DISABLED_PREFIX, DEFAULT_EVENT_KEY};

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.modkeeper/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".modkeeper").join("config.toml"))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Mod folder configuration
    #[serde(default)]
    pub mods: ModsConfig,

    /// Watch registry configuration
    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// Mod folder layout and naming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModsConfig {
    /// Root folder containing one folder per character
    #[serde(default)]
    pub root_path: Option<PathBuf>,

    /// Prefix prepended to a folder name to disable it
    #[serde(default = "default_disabled_prefix")]
    pub disabled_prefix: String,
}

/// Watch registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Event key notifications for the mod root are published under
    #[serde(default = "default_event_key")]
    pub event_key: String,

    /// Watch immediate subdirectories of the root as well
    #[serde(default = "default_one_level")]
    pub one_level: bool,

    /// Capacity of the channels between the native watcher and the dispatch loop
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Attempts at creating the native watcher before giving up
    #[serde(default = "default_max_init_retries")]
    pub max_init_retries: u32,

    /// Delay between native watcher creation attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

// Default implementations

impl Default for ModsConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            disabled_prefix: default_disabled_prefix(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            event_key: default_event_key(),
            one_level: default_one_level(),
            queue_capacity: default_queue_capacity(),
            max_init_retries: default_max_init_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.watcher.event_key.trim().is_empty() {
            return Err(Error::config("watcher.event_key must not be empty"));
        }

        if self.watcher.queue_capacity == 0 {
            return Err(Error::config(
                "watcher.queue_capacity must be greater than 0".to_string(),
            ));
        }

        if self.watcher.max_init_retries == 0 {
            return Err(Error::config(
                "watcher.max_init_retries must be at least 1".to_string(),
            ));
        }

        let prefix = &self.mods.disabled_prefix;
        if prefix.trim().is_empty() || !prefix.ends_with(' ') {
            return Err(Error::config(format!(
                "mods.disabled_prefix must be a word followed by a space, got {prefix:?}"
            )));
        }

        if let Some(root) = &self.mods.root_path {
            if root.as_os_str().is_empty() {
                return Err(Error::config("mods.root_path must not be empty"));
            }
        }

        Ok(())
    }

    /// Returns the configured mod root or an error explaining how to set it
    pub fn require_root_path(&self) -> Result<PathBuf> {
        self.mods.root_path.clone().ok_or_else(|| {
            Error::config(
                "mod root path is not set (use [mods] root_path or MODKEEPER_MODS__ROOT_PATH)",
            )
        })
    }
}
