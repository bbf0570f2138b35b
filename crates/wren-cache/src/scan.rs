use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::path::normalize_module_path;
use crate::transform::{Transform, TransformOutput};

static JS_IMPORT: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"(?:import|export)\s+(?:[^'";]*?\s+from\s+)?['"]([^'"]+)['"]"#).ok()
});

static JS_DYNAMIC_IMPORT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"import\(\s*['"]([^'"]+)['"]\s*\)"#).ok());

static CSS_IMPORT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"@import\s+(?:url\(\s*)?['"]([^'"]+)['"]"#).ok());

/// Pass-through transform for files the browser already understands.
///
/// Output is the source unchanged. Relative and root-absolute static imports are
/// recorded as dependencies so editing an imported module invalidates its importers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleScanner;

impl ModuleScanner {
    pub fn new() -> Self {
        Self
    }

    fn local_imports(path: &str, specifiers: Vec<String>) -> Vec<String> {
        let dir = match path.rfind('/') {
            Some(idx) => &path[..idx],
            None => "",
        };

        let mut dependencies = Vec::new();
        for specifier in specifiers {
            let resolved = if specifier.starts_with("./") || specifier.starts_with("../") {
                normalize_module_path(&format!("{dir}/{specifier}"))
            } else if specifier.starts_with('/') && !specifier.starts_with("//") {
                normalize_module_path(&specifier)
            } else {
                continue;
            };
            if !resolved.is_empty() && !dependencies.contains(&resolved) {
                dependencies.push(resolved);
            }
        }
        dependencies
    }
}

/// Every specifier a JavaScript module imports (static, re-export and dynamic), in
/// order of first appearance.
pub fn import_specifiers(source: &str) -> Vec<String> {
    specifiers(source, &[JS_IMPORT.as_ref(), JS_DYNAMIC_IMPORT.as_ref()])
}

fn specifiers(source: &str, patterns: &[Option<&Regex>]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for pattern in patterns.iter().flatten() {
        for captures in pattern.captures_iter(source) {
            let Some(specifier) = captures.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if !found.iter().any(|s| s == specifier) {
                found.push(specifier.to_string());
            }
        }
    }
    found
}

impl Transform for ModuleScanner {
    fn handles(&self, path: &str) -> bool {
        [".js", ".mjs", ".css"].iter().any(|ext| path.ends_with(ext))
    }

    fn transform(&self, path: &str, source: &[u8]) -> Result<TransformOutput> {
        let text = String::from_utf8_lossy(source);
        let found = if path.ends_with(".css") {
            specifiers(&text, &[CSS_IMPORT.as_ref()])
        } else {
            import_specifiers(&text)
        };
        let dependencies = Self::local_imports(path, found);

        Ok(TransformOutput {
            code: source.to_vec(),
            dependencies,
        })
    }
}
