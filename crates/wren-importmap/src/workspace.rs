//! Workspace member discovery.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::package_json::PackageJson;

/// A package found through the root's `workspaces` patterns.
#[derive(Debug, Clone)]
pub struct WorkspacePackage {
    pub name: String,
    /// Absolute directory of the member.
    pub root_path: PathBuf,
    pub dependencies: Vec<String>,
    pub package: PackageJson,
}

/// Expand the root's workspace patterns into member packages, sorted by path.
///
/// `!`-prefixed patterns exclude matches. Directories without a readable, named
/// package.json are skipped with a warning.
pub fn discover_workspace_packages(root: &Path, root_pkg: &PackageJson) -> Vec<WorkspacePackage> {
    let (excludes, includes): (Vec<&String>, Vec<&String>) = root_pkg
        .workspace_patterns()
        .iter()
        .partition(|pattern| pattern.starts_with('!'));

    let excludes: Vec<glob::Pattern> = excludes
        .into_iter()
        .filter_map(|pattern| match glob::Pattern::new(pattern.trim_start_matches('!')) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(pattern = %pattern, "Invalid workspace exclusion pattern: {}", e);
                None
            }
        })
        .collect();

    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let mut members: BTreeMap<PathBuf, WorkspacePackage> = BTreeMap::new();

    for pattern in includes {
        let relative = pattern.trim_start_matches("./").trim_end_matches('/');
        let full = format!("{}/{}", escaped_root, relative);
        let paths = match glob::glob(&full) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!(pattern = %pattern, "Invalid workspace pattern: {}", e);
                continue;
            }
        };

        for dir in paths.flatten() {
            if !dir.is_dir() || members.contains_key(&dir) {
                continue;
            }
            let rel = relative_slash_path(root, &dir);
            if excludes.iter().any(|exclude| exclude.matches(&rel)) {
                continue;
            }
            match PackageJson::from_dir(&dir) {
                Ok(Some(package)) => {
                    let Some(name) = package.name.clone() else {
                        tracing::warn!(
                            dir = %dir.display(),
                            "Workspace package has no name, skipping"
                        );
                        continue;
                    };
                    let dependencies = package.dependencies.keys().cloned().collect();
                    members.insert(
                        dir.clone(),
                        WorkspacePackage {
                            name,
                            root_path: dir,
                            dependencies,
                            package,
                        },
                    );
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping workspace package: {}", e),
            }
        }
    }

    members.into_values().collect()
}

/// Nearest directory at or above `start` that owns installed dependencies.
///
/// That is the first directory with a `node_modules` folder or a package.json
/// declaring workspaces. The search stops at a `.git` boundary or the filesystem
/// root, in which case `start` itself is returned.
pub fn find_workspace_root(start: &Path) -> PathBuf {
    let mut dir = start;
    loop {
        if dir.join("node_modules").is_dir() {
            return dir.to_path_buf();
        }
        if let Ok(Some(pkg)) = PackageJson::from_dir(dir) {
            if pkg.is_workspace_root() {
                return dir.to_path_buf();
            }
        }
        if dir.join(".git").is_dir() {
            return start.to_path_buf();
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return start.to_path_buf(),
        }
    }
}

/// `dir` relative to `root` with `/` separators; empty when they are equal.
pub(crate) fn relative_slash_path(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}
