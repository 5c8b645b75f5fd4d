//! File operations on the mod folder tree
//!
//! Layout is `<root>/<character>/<mod>`. Renames and deletions take the write
//! lock of the directory containing the mod folder; preview reads take the
//! read lock of that same directory, so a preview is never read from a
//! folder that is being renamed away.

use crate::preview::{self, PreviewBytes, PreviewImage};
use crate::status::{is_disabled, toggled_name};
use modkeeper_core::error::{Error, Result};
use modkeeper_core::path::{containing_directory, normalize_path};
use modkeeper_core::{Config, ModsConfig};
use modkeeper_dirlock::DirectoryLockManager;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A character folder directly below the mod root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModFolder {
    pub name: String,
    pub path: PathBuf,
}

/// A mod folder inside a character folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModInfo {
    pub name: String,
    pub path: PathBuf,
    pub enabled: bool,
    pub preview: Option<PreviewImage>,
}

pub struct ModLibrary {
    root: PathBuf,
    locks: Arc<DirectoryLockManager>,
    disabled_prefix: String,
}

impl ModLibrary {
    pub fn new(
        root: impl AsRef<Path>,
        locks: Arc<DirectoryLockManager>,
        options: &ModsConfig,
    ) -> Self {
        Self {
            root: normalize_path(root.as_ref()),
            locks,
            disabled_prefix: options.disabled_prefix.clone(),
        }
    }

    /// Build from loaded configuration; fails if no root path is configured
    pub fn from_config(config: &Config, locks: Arc<DirectoryLockManager>) -> Result<Self> {
        let root = config.require_root_path()?;
        Ok(Self::new(root, locks, &config.mods))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Character folders under the root, sorted by name
    pub async fn mod_folders(&self) -> Result<Vec<ModFolder>> {
        let folders = list_subdirectories(&self.root)
            .await?
            .into_iter()
            .map(|(name, path)| ModFolder { name, path })
            .collect();
        Ok(folders)
    }

    /// Mods of one character folder with their status and preview image
    pub async fn character_mods(&self, dir: impl AsRef<Path>) -> Result<Vec<ModInfo>> {
        let dir = normalize_path(dir.as_ref());
        let mut mods = Vec::new();

        for (name, path) in list_subdirectories(&dir).await? {
            let preview = self.find_preview_image(&path).await;
            mods.push(ModInfo {
                enabled: !is_disabled(&name, &self.disabled_prefix),
                name,
                path,
                preview,
            });
        }

        debug!("Found {} mods in {}", mods.len(), dir.display());
        Ok(mods)
    }

    pub async fn find_preview_image(&self, dir: impl AsRef<Path>) -> Option<PreviewImage> {
        let dir = dir.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || preview::find_preview_image(&dir))
            .await
            .ok()
            .flatten()
    }

    /// Enable a disabled mod or disable an enabled one by renaming its folder.
    ///
    /// Returns the folder's new path.
    pub async fn switch_mod_status(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = normalize_path(path.as_ref());
        let _guard = self.locks.acquire_write(&path).await;

        require_directory(&path).await?;
        let name = folder_name(&path)?;
        let new_name = toggled_name(name, &self.disabled_prefix);
        if new_name.trim().is_empty() {
            return Err(Error::invalid_input(format!(
                "{} has no name left after removing the prefix",
                path.display()
            )));
        }

        let target = path.with_file_name(&new_name);
        if tokio::fs::try_exists(&target).await? {
            return Err(Error::invalid_input(format!("{} already exists", target.display())));
        }

        tokio::fs::rename(&path, &target).await?;
        info!("Renamed {} -> {}", path.display(), target.display());
        Ok(target)
    }

    /// Remove a mod folder and everything in it
    pub async fn delete_mod(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = normalize_path(path.as_ref());
        if path == self.root || !path.starts_with(&self.root) {
            return Err(Error::invalid_input(format!(
                "refusing to delete {} outside the mod root",
                path.display()
            )));
        }

        let _guard = self.locks.acquire_write(&path).await;
        require_directory(&path).await?;
        tokio::fs::remove_dir_all(&path).await?;
        info!("Deleted {}", path.display());
        Ok(())
    }

    /// Read a preview image for serving
    pub async fn read_preview(&self, path: impl AsRef<Path>) -> Result<PreviewBytes> {
        let path = normalize_path(path.as_ref());
        if !preview::is_supported_image(&path) {
            return Err(Error::invalid_input(format!(
                "{} is not a supported image",
                path.display()
            )));
        }

        // Lock the mod folder's container, the same key a rename of it takes
        let mod_dir = containing_directory(&path);
        let _guard = self.locks.acquire_read(&mod_dir).await;

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_or_io(&path, e))?;
        Ok(PreviewBytes {
            content_type: preview::content_type(&bytes, &path),
            bytes,
        })
    }
}

fn not_found_or_io(path: &Path, err: std::io::Error) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::not_found(path)
    } else {
        Error::Io(err)
    }
}

async fn require_directory(path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| not_found_or_io(path, e))?;
    if !metadata.is_dir() {
        return Err(Error::invalid_input(format!("{} is not a folder", path.display())));
    }
    Ok(())
}

fn folder_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::invalid_input(format!("{} has no usable name", path.display())))
}

/// Subdirectories of `dir` as (name, path), sorted by name
async fn list_subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| not_found_or_io(dir, e))?;

    let mut folders = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => folders.push((name, entry.path())),
            Err(raw) => warn!("Skipping folder with non UTF-8 name: {raw:?}"),
        }
    }

    folders.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(folders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn library(root: &Path) -> ModLibrary {
        ModLibrary::new(
            root,
            Arc::new(DirectoryLockManager::new()),
            &ModsConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_mod_folders_sorted_and_directories_only() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["Zhongli", "Albedo", "Keqing"] {
            tokio::fs::create_dir(root.join(name)).await.unwrap();
        }
        tokio::fs::write(root.join("notes.txt"), "").await.unwrap();

        let names: Vec<String> = library(root)
            .mod_folders()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Albedo", "Keqing", "Zhongli"]);
    }

    #[tokio::test]
    async fn test_missing_root_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = library(&temp_dir.path().join("missing")).mod_folders().await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_switch_on_file_is_invalid_input() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("ModA");
        tokio::fs::write(&file, "").await.unwrap();

        let result = library(temp_dir.path()).switch_mod_status(&file).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_switch_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        tokio::fs::create_dir(root.join("ModA")).await.unwrap();
        tokio::fs::create_dir(root.join("DISABLED ModA")).await.unwrap();

        let result = library(root).switch_mod_status(root.join("ModA")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(root.join("ModA").is_dir());
    }

    #[tokio::test]
    async fn test_delete_outside_root_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("Mods");
        let outside = temp_dir.path().join("Saves");
        tokio::fs::create_dir(&root).await.unwrap();
        tokio::fs::create_dir(&outside).await.unwrap();

        let library = library(&root);
        assert!(matches!(
            library.delete_mod(&outside).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            library.delete_mod(&root).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(outside.is_dir());
    }

    #[tokio::test]
    async fn test_read_preview_rejects_non_images() {
        let temp_dir = TempDir::new().unwrap();
        let result = library(temp_dir.path())
            .read_preview(temp_dir.path().join("ModA").join("mod.ini"))
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_from_config_requires_root() {
        let locks = Arc::new(DirectoryLockManager::new());
        assert!(matches!(
            ModLibrary::from_config(&Config::default(), Arc::clone(&locks)),
            Err(Error::Config(_))
        ));

        let mut config = Config::default();
        config.mods.root_path = Some(PathBuf::from("/games/Mods"));
        let library = ModLibrary::from_config(&config, locks).unwrap();
        assert_eq!(library.root(), Path::new("/games/Mods"));
    }
}
