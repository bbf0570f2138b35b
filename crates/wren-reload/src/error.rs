use std::path::PathBuf;

pub type Result<T, E = ReloadError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("failed to read entry point {}: {source}", .path.display())]
    EntryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("entry point {} is not valid UTF-8", .0.display())]
    EntryEncoding(PathBuf),
}
