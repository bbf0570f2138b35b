//! Ignore rules: plain names, glob patterns and editor temp files.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Component, Path};

use crate::error::{Result, WatchError};

/// Decides which paths below the watch root are never reported.
///
/// Patterns without glob syntax or `/` (`node_modules`, `.git`) match any path
/// component with that exact name. Everything else is a glob matched against the
/// root-relative path with `/` separators (`**/*.log`, `coverage/**`).
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    names: HashSet<String>,
    globs: GlobSet,
}

impl IgnoreMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut names = HashSet::new();
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            if is_plain_name(pattern) {
                names.insert(pattern.to_string());
                continue;
            }
            let glob = Glob::new(pattern).map_err(|source| WatchError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            builder.add(glob);
        }

        let globs = builder.build().map_err(|source| WatchError::InvalidPattern {
            pattern: patterns
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            source,
        })?;

        Ok(Self { names, globs })
    }

    /// Whether `relative` (a path below the watch root) is ignored.
    pub fn is_ignored(&self, relative: &Path) -> bool {
        let mut normalized = String::new();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                continue;
            };
            let part = part.to_string_lossy();
            if self.names.contains(part.as_ref()) {
                return true;
            }
            if !normalized.is_empty() {
                normalized.push('/');
            }
            normalized.push_str(&part);
        }

        if relative
            .file_name()
            .is_some_and(|name| is_editor_temp_file(&name.to_string_lossy()))
        {
            return true;
        }

        !normalized.is_empty() && self.globs.is_match(&normalized)
    }
}

fn is_plain_name(pattern: &str) -> bool {
    !pattern.contains(['*', '?', '[', '{', '/', '\\'])
}

/// Swap, backup and lock files that editors write next to the real file.
///
/// All-digit names are the probe files some editors create to test write access.
pub fn is_editor_temp_file(name: &str) -> bool {
    if name.starts_with('.')
        && (name.ends_with(".swp") || name.ends_with(".swo") || name.ends_with(".swn"))
    {
        return true;
    }
    if name.ends_with('~') {
        return true;
    }
    if name.len() > 1 && name.starts_with('#') && name.ends_with('#') {
        return true;
    }
    if name.starts_with(".#") {
        return true;
    }
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(patterns: &[&str]) -> IgnoreMatcher {
        IgnoreMatcher::new(patterns).unwrap()
    }

    #[test]
    fn plain_names_match_any_component() {
        let m = matcher(&["node_modules", ".git"]);
        assert!(m.is_ignored(Path::new("node_modules/lit/index.js")));
        assert!(m.is_ignored(Path::new("packages/ui/node_modules/x.js")));
        assert!(m.is_ignored(Path::new(".git")));
        assert!(!m.is_ignored(Path::new("src/node_modules_helper.js")));
    }

    #[test]
    fn globs_match_relative_paths() {
        let m = matcher(&["**/*.log", "coverage/**"]);
        assert!(m.is_ignored(Path::new("debug.log")));
        assert!(m.is_ignored(Path::new("a/b/trace.log")));
        assert!(m.is_ignored(Path::new("coverage/lcov.info")));
        assert!(!m.is_ignored(Path::new("src/index.js")));
    }

    #[test]
    fn editor_temp_files_are_always_ignored() {
        let m = matcher(&[]);
        for name in [".index.js.swp", ".a.swo", "notes.md~", "#draft#", ".#lock", "4913"] {
            assert!(m.is_ignored(Path::new(name)), "{name} should be ignored");
        }
        assert!(!m.is_ignored(Path::new("v2.js")));
        assert!(!m.is_ignored(Path::new("#")));
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let err = IgnoreMatcher::new(&["src/[unclosed"]).unwrap_err();
        assert!(matches!(err, WatchError::InvalidPattern { .. }));
    }
}
