//! The compiler seam and the cached read path built on it.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, TransformError};
use crate::key::CacheKey;
use crate::store::{CacheEntry, TransformCache};

/// What a transform produces for one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOutput {
    pub code: Vec<u8>,
    /// Module paths whose changes must invalidate this output.
    pub dependencies: Vec<String>,
}

/// Source-to-browser compilation for one file at a time.
///
/// Implementations are pure with respect to their inputs: the same path and bytes
/// always produce the same output.
pub trait Transform: Send + Sync {
    /// Whether `path` (a module path) is compiled by this transform.
    fn handles(&self, path: &str) -> bool;

    fn transform(&self, path: &str, source: &[u8]) -> Result<TransformOutput>;
}

/// Serve `path` through the cache, compiling on a miss.
///
/// The file is stat'ed first so an edited file produces a new key and misses.
pub fn load(
    cache: &TransformCache,
    transform: &dyn Transform,
    root: &Path,
    path: &str,
) -> Result<Arc<CacheEntry>> {
    if !transform.handles(path) {
        return Err(TransformError::Unsupported(path.to_string()));
    }

    let file = root.join(path);
    let metadata = fs::metadata(&file).map_err(|source| TransformError::Io {
        path: file.clone(),
        source,
    })?;
    let key = CacheKey::from_metadata(path, &metadata);

    if let Some(entry) = cache.get(&key) {
        return Ok(entry);
    }

    let source = fs::read(&file).map_err(|source| TransformError::Io {
        path: file.clone(),
        source,
    })?;
    let output = transform.transform(path, &source)?;
    tracing::debug!(
        path,
        bytes = output.code.len(),
        dependencies = output.dependencies.len(),
        "Transformed module"
    );

    let entry = CacheEntry {
        size_bytes: output.code.len() as u64,
        output: output.code,
        dependencies: output.dependencies,
    };
    cache.set(key, entry.output.clone(), entry.dependencies.clone());
    Ok(Arc::new(entry))
}
