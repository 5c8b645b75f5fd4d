//! Core types shared by the modkeeper crates
//!
//! This crate provides the foundations used throughout the workspace:
//!
//! - **Error handling**: the unified error taxonomy for watching, locking and
//!   file operations
//! - **Configuration**: layered TOML + environment configuration
//! - **Paths**: normalization used to key watch subscriptions and directory locks
//!

pub mod config;
pub mod error;
pub mod path;

// Re-export main types for convenience
pub use config::{Config, ModsConfig, WatcherConfig};
pub use error::{Error, Result};
pub use path::{canonical_or_normalized, containing_directory, normalize_path};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
}
