#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Live directory watching for mod folders
//!
//! This crate provides a registry of watched directories that:
//! - Watches roots non-recursively, optionally with their immediate subdirectories
//! - Tracks new subdirectories and forgets removed ones as the tree changes
//! - Publishes notifications keyed by caller-chosen event keys
//! - Forwards native watcher faults without stopping
//!
//! # Example
//!
//! ```no_run
//! use modkeeper_watcher::{RegistryConfig, WatchRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (registry, mut notifications) =
//!     WatchRegistry::with_channel(RegistryConfig::default()).await?;
//!
//! registry.watch_one_level("/games/Mods", "mods-changed").await?;
//!
//! while let Some(notification) = notifications.recv().await {
//!     println!("{notification}");
//! }
//! # Ok(())
//! # }
//! ```

// Private implementation modules
mod config;
mod events;
mod reconcile;
mod registry;
mod sink;
mod subscription;

// Public exports - minimal API surface
pub use config::{RegistryConfig, RegistryConfigBuilder};
pub use events::{Notification, OperationKind, WATCHER_ERROR_KEY};
pub use registry::WatchRegistry;
pub use sink::NotificationSink;
pub use subscription::{Depth, WatchMode, WatchSubscription};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::RegistryConfig;
    pub use crate::events::Notification;
    pub use crate::registry::WatchRegistry;
}
