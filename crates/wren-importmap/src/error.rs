use std::path::PathBuf;

pub type Result<T, E = ImportMapError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ImportMapError {
    #[error("import map override file not found: {}", .0.display())]
    OverrideNotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },
}
