//! Preview image discovery and content-type detection

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif", "gif"];

/// Image shown for a mod in the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewImage {
    /// File name as found on disk
    pub name: String,
    pub path: PathBuf,
}

/// Raw preview bytes ready to be served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewBytes {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

fn is_preview_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.to_lowercase().starts_with("preview"))
}

/// First preview image below `dir`, searching depth-first in name order.
///
/// Blocking; callers on the runtime go through `spawn_blocking`.
pub fn find_preview_image(dir: &Path) -> Option<PreviewImage> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| is_preview_name(entry.path()) && is_supported_image(entry.path()))
        .map(|entry| PreviewImage {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.into_path(),
        })
}

/// MIME type from magic bytes, falling back to the file extension
pub fn content_type(bytes: &[u8], path: &Path) -> &'static str {
    sniff(bytes).unwrap_or_else(|| from_extension(path))
}

fn sniff(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.len() >= 12
        && &bytes[4..8] == b"ftyp"
        && matches!(&bytes[8..12], b"avif" | b"avis")
    {
        Some("image/avif")
    } else {
        None
    }
}

fn from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}
