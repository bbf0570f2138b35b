use path_clean::PathClean;
use std::path::{Component, Path, PathBuf};

/// Root-relative module path for a file below `root`.
///
/// Returns `None` for paths outside the root and for the root itself.
pub fn module_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .clean()
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Collapse `.`/`..` segments and drop any leading `/`.
///
/// `"/src/../lib/a.js"` becomes `"lib/a.js"`. Segments that climb above the root are
/// kept so they never alias a real module path.
pub fn normalize_module_path(path: &str) -> String {
    let cleaned = PathBuf::from(path).clean();
    let normalized = cleaned.to_string_lossy().replace('\\', "/");
    let trimmed = normalized.trim_start_matches('/');
    if trimmed == "." {
        String::new()
    } else {
        trimmed.to_string()
    }
}
