use std::path::PathBuf;

pub type Result<T, E = TransformError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {message}")]
    Compile { path: String, message: String },

    #[error("no transform handles {0}")]
    Unsupported(String),
}

impl TransformError {
    /// Module path the error refers to, when it came from a file.
    pub fn file(&self) -> String {
        match self {
            TransformError::Io { path, .. } => path.display().to_string(),
            TransformError::Compile { path, .. } | TransformError::Unsupported(path) => {
                path.clone()
            }
        }
    }
}
