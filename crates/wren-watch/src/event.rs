use std::path::PathBuf;
use std::time::SystemTime;

/// Kind of a single raw filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Modify,
    Remove,
}

/// One debounced batch of changes.
///
/// Flags summarize the raw changes that were coalesced into the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// Absolute paths, sorted and de-duplicated.
    pub paths: Vec<PathBuf>,
    pub has_creates: bool,
    pub has_deletes: bool,
    /// A `package.json` was touched somewhere in the batch.
    pub has_package_metadata_change: bool,
    pub timestamp: SystemTime,
}

impl FileEvent {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether the set of files (or package metadata) changed, not just contents.
    pub fn changes_structure(&self) -> bool {
        self.has_creates || self.has_deletes || self.has_package_metadata_change
    }
}
