#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Per-directory read/write coordination
//!
//! Serializes renames (writers) against file reads (readers) in the same
//! directory, so an image being streamed to the UI is never invalidated by
//! a concurrent enable/disable of its mod folder.
//!
//! # Example
//!
//! ```no_run
//! use modkeeper_dirlock::DirectoryLockManager;
//!
//! # async fn example() {
//! let locks = DirectoryLockManager::new();
//!
//! let guard = locks.acquire_write("/games/Mods/Character/ModA").await;
//! // rename ModA while no reader holds /games/Mods/Character
//! guard.release();
//! # }
//! ```

mod manager;

pub use manager::{DirectoryLockManager, DirectoryReadGuard, DirectoryWriteGuard};
