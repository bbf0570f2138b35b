//! Cache keys identify one snapshot of a source file.

use std::fs::Metadata;
use std::time::SystemTime;

/// A file's identity at one point in time.
///
/// The same path with a different modification time or size is a different key, so
/// stale output is never returned for an edited file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: String,
    pub modified: SystemTime,
    pub size: u64,
}

impl CacheKey {
    pub fn new(path: impl Into<String>, modified: SystemTime, size: u64) -> Self {
        Self {
            path: path.into(),
            modified,
            size,
        }
    }

    /// Build a key from filesystem metadata.
    ///
    /// Platforms without modification times fall back to the epoch so size alone
    /// distinguishes snapshots.
    pub fn from_metadata(path: impl Into<String>, metadata: &Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Self::new(path, modified, metadata.len())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nanos = self
            .modified
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        write!(f, "{}@{}:{}", self.path, nanos, self.size)
    }
}
