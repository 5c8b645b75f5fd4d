#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Mod folder operations
//!
//! Lists character and mod folders, toggles mods on and off by renaming
//! their folders, and serves preview images. Every mutation goes through a
//! shared [`DirectoryLockManager`](modkeeper_dirlock::DirectoryLockManager).

mod library;
mod preview;
mod status;

pub use library::{ModFolder, ModInfo, ModLibrary};
pub use preview::{
    content_type, find_preview_image, is_supported_image, PreviewBytes, PreviewImage,
};
pub use status::{is_disabled, toggled_name};
