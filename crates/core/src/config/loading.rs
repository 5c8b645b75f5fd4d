//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;

use super::defaults::*;
use super::{global_config_path, Config};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `MODKEEPER_` and use double underscores
    /// for nested values. For example:
    /// - `MODKEEPER_MODS__ROOT_PATH=/games/mods`
    /// - `MODKEEPER_WATCHER__ONE_LEVEL=false`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // config crate doesn't apply serde defaults for missing sections
        let builder = set_config_default(builder, "mods.disabled_prefix", default_disabled_prefix())?;
        let builder = set_config_default(builder, "watcher.event_key", default_event_key())?;
        let builder = set_config_default(builder, "watcher.one_level", default_one_level())?;
        let builder = set_config_default(
            builder,
            "watcher.queue_capacity",
            default_queue_capacity() as i64,
        )?;
        let builder = set_config_default(
            builder,
            "watcher.max_init_retries",
            default_max_init_retries() as i64,
        )?;
        let mut builder = set_config_default(
            builder,
            "watcher.retry_delay_ms",
            default_retry_delay_ms() as i64,
        )?;

        // Add the config file if it exists
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("MODKEEPER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.modkeeper/config.toml or custom --config path)
    /// 3. Environment variables (MODKEEPER_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        tracing::debug!("Loading configuration from {}", path.display());
        Self::from_file(&path)
    }
}
