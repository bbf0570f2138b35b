//! HTML entry points and the module imports they declare.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use wren_cache::{import_specifiers, module_path};
use wren_watch::IgnoreMatcher;

use crate::error::{ReloadError, Result};
use crate::hub::normalize_page_url;

static MODULE_SCRIPT: Lazy<Option<Selector>> =
    Lazy::new(|| Selector::parse(r#"script[type="module"]"#).ok());

/// A served HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Page URL as clients report it (see [`normalize_page_url`]).
    pub url: String,
    /// Module path of the HTML file (`demos/card/index.html`).
    pub file: String,
}

impl EntryPoint {
    pub fn from_file(file: impl Into<String>) -> Self {
        let file = file.into();
        Self {
            url: normalize_page_url(&format!("/{}", file)),
            file,
        }
    }

    /// Parse the HTML file under `root` and list its module import specifiers.
    pub fn imports(&self, root: &Path) -> Result<Vec<String>> {
        let path = root.join(&self.file);
        let bytes = std::fs::read(&path).map_err(|source| ReloadError::EntryRead {
            path: path.clone(),
            source,
        })?;
        let html = String::from_utf8(bytes).map_err(|_| ReloadError::EntryEncoding(path))?;
        Ok(extract_module_imports(&html))
    }
}

/// Where the orchestrator learns which pages exist.
pub trait EntryPointSource: Send + Sync {
    fn entry_points(&self) -> Vec<EntryPoint>;
}

impl EntryPointSource for Vec<EntryPoint> {
    fn entry_points(&self) -> Vec<EntryPoint> {
        self.clone()
    }
}

/// Every `.html` file under the root, rescanned on each call.
pub struct ScannedEntryPoints {
    root: PathBuf,
    ignore: IgnoreMatcher,
}

impl ScannedEntryPoints {
    pub fn new(root: impl Into<PathBuf>, ignore: IgnoreMatcher) -> Self {
        Self {
            root: root.into(),
            ignore,
        }
    }
}

impl EntryPointSource for ScannedEntryPoints {
    fn entry_points(&self) -> Vec<EntryPoint> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| match entry.path().strip_prefix(&self.root) {
                Ok(relative) => {
                    relative.as_os_str().is_empty() || !self.ignore.is_ignored(relative)
                }
                Err(_) => false,
            });

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "html")
            })
            .filter_map(|entry| module_path(&self.root, entry.path()))
            .map(EntryPoint::from_file)
            .collect()
    }
}

/// Import specifiers from `<script type="module">` tags: each `src` plus every
/// static or dynamic import in inline scripts, in document order and deduplicated.
pub fn extract_module_imports(html: &str) -> Vec<String> {
    let Some(selector) = MODULE_SCRIPT.as_ref() else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    let mut imports: Vec<String> = Vec::new();
    let mut push = |specifier: String| {
        if !specifier.is_empty() && !imports.contains(&specifier) {
            imports.push(specifier);
        }
    };

    for script in document.select(selector) {
        if let Some(src) = script.value().attr("src") {
            push(src.trim().to_string());
            continue;
        }
        let inline: String = script.text().collect();
        for specifier in import_specifiers(&inline) {
            push(specifier);
        }
    }
    imports
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn extracts_external_and_inline_module_imports() {
        let html = r#"<!doctype html>
<html><head>
  <script type="module" src="./card.js"></script>
  <script src="/legacy.js"></script>
  <script type="module">
    import 'lit';
    import { Card } from '/elements/card/card.js';
    import('./lazy.js');
  </script>
  <script type="module" src="./card.js"></script>
</head><body></body></html>"#;

        assert_eq!(
            extract_module_imports(html),
            vec!["./card.js", "lit", "/elements/card/card.js", "./lazy.js"]
        );
    }

    #[test]
    fn entry_urls_follow_page_normalization() {
        assert_eq!(EntryPoint::from_file("demos/card/index.html").url, "/demos/card/");
        assert_eq!(EntryPoint::from_file("about.html").url, "/about.html");
        assert_eq!(EntryPoint::from_file("index.html").url, "/");
    }

    #[test]
    fn scanning_skips_ignored_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for file in ["index.html", "demos/a/index.html", "node_modules/pkg/index.html"] {
            let path = root.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "<html></html>").unwrap();
        }
        std::fs::write(root.join("demos/a/a.js"), "").unwrap();

        let ignore = IgnoreMatcher::new(&["node_modules"]).unwrap();
        let source = ScannedEntryPoints::new(root, ignore);
        let files: Vec<String> = source.entry_points().into_iter().map(|e| e.file).collect();
        assert_eq!(files, vec!["demos/a/index.html", "index.html"]);
    }
}
