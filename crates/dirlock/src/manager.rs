//! Per-directory reader/writer locks
//!
//! A rename changes the listing of the directory that contains the renamed
//! entry, so locks are keyed by containing directory rather than by file.

use dashmap::DashMap;
use modkeeper_core::path::containing_directory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::trace;

type DirectoryLock = Arc<RwLock<()>>;

/// Hands out one reader/writer lock per directory.
///
/// Locks are created on first use and kept for the lifetime of the manager.
/// Callers referencing the same directory always share a lock; callers in
/// different directories never contend.
#[derive(Debug, Default)]
pub struct DirectoryLockManager {
    locks: DashMap<PathBuf, DirectoryLock>,
}

impl DirectoryLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock of the directory containing `path` exclusively.
    ///
    /// Waits until no reader or writer holds it.
    pub async fn acquire_write(&self, path: impl AsRef<Path>) -> DirectoryWriteGuard {
        let (directory, lock) = self.lock_for(path.as_ref());
        trace!("Waiting for write lock on {}", directory.display());
        let guard = lock.write_owned().await;
        DirectoryWriteGuard {
            directory,
            _guard: guard,
        }
    }

    /// Take the lock of the directory containing `path` in shared mode.
    ///
    /// Concurrent with other readers, waits for a writer to finish.
    pub async fn acquire_read(&self, path: impl AsRef<Path>) -> DirectoryReadGuard {
        let (directory, lock) = self.lock_for(path.as_ref());
        trace!("Waiting for read lock on {}", directory.display());
        let guard = lock.read_owned().await;
        DirectoryReadGuard {
            directory,
            _guard: guard,
        }
    }

    /// Exclusive lock without waiting; `None` if it is held
    pub fn try_acquire_write(&self, path: impl AsRef<Path>) -> Option<DirectoryWriteGuard> {
        let (directory, lock) = self.lock_for(path.as_ref());
        lock.try_write_owned()
            .ok()
            .map(|guard| DirectoryWriteGuard {
                directory,
                _guard: guard,
            })
    }

    /// Shared lock without waiting; `None` if a writer holds it
    pub fn try_acquire_read(&self, path: impl AsRef<Path>) -> Option<DirectoryReadGuard> {
        let (directory, lock) = self.lock_for(path.as_ref());
        lock.try_read_owned()
            .ok()
            .map(|guard| DirectoryReadGuard {
                directory,
                _guard: guard,
            })
    }

    /// Directory whose lock guards `path`
    pub fn directory_for(&self, path: impl AsRef<Path>) -> PathBuf {
        containing_directory(path.as_ref())
    }

    /// Number of directories a lock has been created for
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Get or create the lock; concurrent first callers converge on one
    /// instance because `entry` holds the shard lock while inserting.
    fn lock_for(&self, path: &Path) -> (PathBuf, DirectoryLock) {
        let directory = containing_directory(path);
        let lock = self
            .locks
            .entry(directory.clone())
            .or_insert_with(|| {
                trace!("Creating lock for {}", directory.display());
                Arc::new(RwLock::new(()))
            })
            .clone();
        (directory, lock)
    }

    #[cfg(test)]
    fn same_lock(&self, a: &Path, b: &Path) -> bool {
        Arc::ptr_eq(&self.lock_for(a).1, &self.lock_for(b).1)
    }
}

/// Exclusive hold on a directory; released on drop
#[derive(Debug)]
pub struct DirectoryWriteGuard {
    directory: PathBuf,
    _guard: OwnedRwLockWriteGuard<()>,
}

impl DirectoryWriteGuard {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Release explicitly; equivalent to dropping the guard
    pub fn release(self) {}
}

/// Shared hold on a directory; released on drop
#[derive(Debug)]
pub struct DirectoryReadGuard {
    directory: PathBuf,
    _guard: OwnedRwLockReadGuard<()>,
}

impl DirectoryReadGuard {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Release explicitly; equivalent to dropping the guard
    pub fn release(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_same_directory_shares_lock() {
        let manager = DirectoryLockManager::new();
        assert!(manager.same_lock(
            Path::new("/mods/Character/ModA"),
            Path::new("/mods/Character/./ModB")
        ));
        assert!(!manager.same_lock(
            Path::new("/mods/Character/ModA"),
            Path::new("/mods/Other/ModA")
        ));
        assert_eq!(manager.lock_count(), 2);
    }

    #[test]
    fn test_directory_for_resolves_parent() {
        let manager = DirectoryLockManager::new();
        assert_eq!(
            manager.directory_for("/mods/Character/ModA"),
            PathBuf::from("/mods/Character")
        );
    }

    #[tokio::test]
    async fn test_writer_excludes_readers_and_writers() {
        let manager = DirectoryLockManager::new();
        let writer = manager.acquire_write("/mods/Character/ModA").await;
        assert_eq!(writer.directory(), Path::new("/mods/Character"));

        assert!(manager.try_acquire_read("/mods/Character/ModB").is_none());
        assert!(manager.try_acquire_write("/mods/Character/ModA").is_none());

        writer.release();
        assert!(manager.try_acquire_read("/mods/Character/ModB").is_some());
    }

    #[tokio::test]
    async fn test_readers_share() {
        let manager = DirectoryLockManager::new();
        let first = manager.acquire_read("/mods/Character/ModA").await;
        let second = manager.acquire_read("/mods/Character/ModB").await;
        assert!(manager.try_acquire_write("/mods/Character/ModC").is_none());

        drop(first);
        assert!(manager.try_acquire_write("/mods/Character/ModC").is_none());
        drop(second);
        assert!(manager.try_acquire_write("/mods/Character/ModC").is_some());
    }

    #[tokio::test]
    async fn test_different_directories_do_not_contend() {
        let manager = DirectoryLockManager::new();
        let _writer = manager.acquire_write("/mods/CharacterA/ModA").await;
        assert!(manager.try_acquire_write("/mods/CharacterB/ModA").is_some());
        assert!(manager.try_acquire_read("/mods/CharacterB/ModA").is_some());
    }
}
