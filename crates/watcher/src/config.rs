//! Configuration for the watch registry

use modkeeper_core::error::{Error, Result};
use modkeeper_core::WatcherConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable configuration for a [`WatchRegistry`](crate::WatchRegistry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Capacity of the native event and error channels (default: 1024)
    pub queue_capacity: usize,
    /// Attempts at creating the native watcher (default: 3)
    pub max_init_retries: u32,
    /// Delay between attempts in milliseconds (default: 100ms)
    pub retry_delay_ms: u64,
}

impl RegistryConfig {
    /// Create configuration from builder
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::default()
    }

    /// Get the retry delay
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Reject values the registry cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(Error::config("queue_capacity must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_init_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl From<&WatcherConfig> for RegistryConfig {
    fn from(config: &WatcherConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity,
            max_init_retries: config.max_init_retries,
            retry_delay_ms: config.retry_delay_ms,
        }
    }
}

/// Builder for RegistryConfig
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    config: RegistryConfig,
}

impl RegistryConfigBuilder {
    /// Set channel capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set native watcher creation attempts
    pub fn max_init_retries(mut self, retries: u32) -> Self {
        self.config.max_init_retries = retries;
        self
    }

    /// Set delay between creation attempts in milliseconds
    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_delay_ms = ms;
        self
    }

    /// Build the configuration
    pub fn build(self) -> RegistryConfig {
        self.config
    }
}
