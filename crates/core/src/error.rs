use std::path::PathBuf;
use thiserror::Error;

/// Result type for modkeeper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for modkeeper operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A native watch could not be established (missing path, permissions,
    /// exhausted watch table) or the registry is already closed
    #[error("Failed to watch {}: {message}", path.display())]
    Watch { path: PathBuf, message: String },

    /// The path has no subscription in the watch registry
    #[error("Path is not watched: {}", .0.display())]
    NotWatched(PathBuf),

    /// The children of a directory could not be listed
    #[error("Failed to enumerate {}: {source}", path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A referenced file or folder does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a watch establishment error
    pub fn watch(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Watch {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a not-watched error
    pub fn not_watched(path: impl Into<PathBuf>) -> Self {
        Self::NotWatched(path.into())
    }

    /// Creates an enumeration error
    pub fn enumeration(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Enumeration {
            path: path.into(),
            source,
        }
    }

    /// Creates a not-found error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Creates an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
