//! Path normalization shared by the watch registry and the lock manager
//!
//! Both components key their maps by path, so two spellings of the same
//! directory (`mods/./a`, `mods/b/../a`, a relative path) must collapse
//! to one key before lookup.

use std::path::{Component, Path, PathBuf};

/// Makes `path` absolute and removes `.` and `..` components lexically.
///
/// Symlinks are not resolved and the path does not have to exist. If the
/// current directory cannot be read, a relative path is normalized as is.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `/..` stays `/`
                if !normalized.pop() && !normalized.has_root() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Resolves symlinks when the path exists, otherwise falls back to
/// [`normalize_path`].
///
/// Native watchers on some platforms report canonical paths (for example
/// `/private/var` on macOS), so watched roots are keyed canonically.
pub fn canonical_or_normalized(path: &Path) -> PathBuf {
    match std::fs::canonicalize(path) {
        Ok(canonical) => canonical,
        Err(_) => normalize_path(path),
    }
}

/// Returns the normalized directory that contains `path`.
///
/// A path without a parent (a filesystem root) is its own directory.
pub fn containing_directory(path: &Path) -> PathBuf {
    let normalized = normalize_path(path);
    match normalized.parent() {
        Some(parent) => parent.to_path_buf(),
        None => normalized,
    }
}
