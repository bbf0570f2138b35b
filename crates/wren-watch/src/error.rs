use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = WatchError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("watch root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
