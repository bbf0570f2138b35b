//! The import map document and browser-style specifier resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Specifier to URL mappings in one scope (or the top level).
pub type SpecifierMap = BTreeMap<String, String>;

/// A browser import map: `{"imports": {...}, "scopes": {...}}`.
///
/// Ordered maps keep the serialized form stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMap {
    #[serde(default)]
    pub imports: SpecifierMap,
    #[serde(default)]
    pub scopes: BTreeMap<String, SpecifierMap>,
}

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.scopes.is_empty()
    }

    pub fn insert(&mut self, specifier: impl Into<String>, path: impl Into<String>) {
        self.imports.insert(specifier.into(), path.into());
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"imports":{},"scopes":{}}"#.to_string())
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| r#"{"imports":{},"scopes":{}}"#.to_string())
    }

    /// Resolve a specifier the way a browser would.
    ///
    /// Scopes whose prefix matches `referrer` are tried longest first, then the
    /// top-level imports. Within each map an exact key beats any prefix key, and among
    /// prefix keys (ending in `/`) the longest match wins.
    pub fn resolve(&self, specifier: &str, referrer: Option<&str>) -> Option<String> {
        if let Some(referrer) = referrer {
            let mut scopes: Vec<(&String, &SpecifierMap)> = self
                .scopes
                .iter()
                .filter(|(prefix, _)| referrer.starts_with(prefix.as_str()))
                .collect();
            scopes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

            for (_, map) in scopes {
                if let Some(resolved) = resolve_in(map, specifier) {
                    return Some(resolved);
                }
            }
        }
        resolve_in(&self.imports, specifier)
    }

    /// Merge `other` over this map. Later entries win; scopes merge per key.
    ///
    /// Keys containing NUL or line breaks are dropped with a warning. `source` names
    /// where the entries came from in that warning.
    pub fn merge(&mut self, other: ImportMap, source: &str) {
        for (key, value) in other.imports {
            if !is_valid_key(&key) {
                tracing::warn!(
                    source,
                    key = ?key,
                    "Skipping import map key with control characters"
                );
                continue;
            }
            self.imports.insert(key, value);
        }

        for (scope, entries) in other.scopes {
            if !is_valid_key(&scope) {
                tracing::warn!(
                    source,
                    scope = ?scope,
                    "Skipping import map scope with control characters"
                );
                continue;
            }
            let target = self.scopes.entry(scope.clone()).or_default();
            for (key, value) in entries {
                if !is_valid_key(&key) {
                    tracing::warn!(
                        source,
                        scope = %scope,
                        key = ?key,
                        "Skipping import map key with control characters"
                    );
                    continue;
                }
                target.insert(key, value);
            }
        }
    }
}

fn resolve_in(map: &SpecifierMap, specifier: &str) -> Option<String> {
    if let Some(exact) = map.get(specifier) {
        return Some(exact.clone());
    }
    map.iter()
        .filter(|(key, _)| key.ends_with('/') && specifier.starts_with(key.as_str()))
        .max_by_key(|(key, _)| key.len())
        .map(|(key, target)| format!("{}{}", target, &specifier[key.len()..]))
}

fn is_valid_key(key: &str) -> bool {
    !key.contains(['\0', '\n', '\r'])
}
