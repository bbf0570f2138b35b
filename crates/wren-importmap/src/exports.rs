//! Turning a package's `exports` (or `main`) into import map entries.
//!
//! Supported subset:
//!
//! - `"exports": "./index.js"` maps the bare name
//! - conditions (`{"import": ..., "default": ...}`, nested) prefer `import`, then `default`
//! - subpaths (`{".": ..., "./button": ...}`) map each subpath
//! - wildcard subpaths (`"./lib/*": "./src/lib/*"`) map the prefix before `*`
//! - no exports: `main` (default `index.js`) plus a trailing-slash mapping

use serde_json::{Map, Value};

use crate::map::SpecifierMap;

/// Entries for package `name` served from `base` (a URL prefix ending in `/`).
pub fn package_entries(
    name: &str,
    exports: Option<&Value>,
    main: Option<&str>,
    base: &str,
) -> SpecifierMap {
    let mut entries = SpecifierMap::new();

    match exports {
        None => {
            let main = main.unwrap_or("index.js");
            match join(base, main) {
                Some(path) => {
                    entries.insert(name.to_string(), path);
                    entries.insert(format!("{}/", name), base.to_string());
                }
                None => tracing::warn!(package = name, main, "Skipping invalid main entry"),
            }
        }
        Some(Value::Object(map)) if map.keys().any(|k| k.starts_with('.')) => {
            subpath_entries(name, map, base, &mut entries);
        }
        Some(value) => match resolve_target(value).and_then(|target| join(base, &target)) {
            Some(path) => {
                entries.insert(name.to_string(), path);
            }
            None => tracing::debug!(package = name, "No importable export target"),
        },
    }

    entries
}

fn subpath_entries(name: &str, map: &Map<String, Value>, base: &str, entries: &mut SpecifierMap) {
    for (key, value) in map {
        if !key.starts_with('.') {
            tracing::warn!(
                package = name,
                key = %key,
                "Skipping condition key mixed with subpath exports"
            );
            continue;
        }
        let Some(target) = resolve_target(value) else {
            continue;
        };

        if let Some(star) = key.find('*') {
            let key_prefix = &key[..star];
            let Some(target_star) = target.find('*') else {
                tracing::warn!(
                    package = name,
                    key = %key,
                    "Wildcard export without wildcard target"
                );
                continue;
            };
            if !key_prefix.ends_with('/') {
                tracing::debug!(
                    package = name,
                    key = %key,
                    "Wildcard export not expressible as a prefix"
                );
                continue;
            }
            let Some(path) = join(base, &target[..target_star]) else {
                continue;
            };
            entries.insert(specifier(name, key_prefix), path);
            continue;
        }

        match join(base, &target) {
            Some(path) => {
                entries.insert(specifier(name, key), path);
            }
            None => tracing::warn!(
                package = name,
                key = %key,
                target = %target,
                "Skipping invalid export target"
            ),
        }
    }
}

/// `"."` is the bare name; `"./x"` becomes `name/x`.
fn specifier(name: &str, subpath: &str) -> String {
    match subpath.strip_prefix("./") {
        Some(rest) => format!("{}/{}", name, rest),
        None => name.to_string(),
    }
}

/// Pick one target out of a string, condition object or fallback array.
fn resolve_target(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(conditions) => ["import", "default"]
            .iter()
            .find_map(|condition| conditions.get(*condition).and_then(resolve_target)),
        Value::Array(candidates) => candidates.iter().find_map(resolve_target),
        _ => None,
    }
}

/// Append a package-relative target to the served base.
///
/// Targets escaping the package (`..` segments) are rejected.
fn join(base: &str, target: &str) -> Option<String> {
    let relative = target.trim_start_matches("./").trim_start_matches('/');
    if relative.split('/').any(|segment| segment == "..") {
        return None;
    }
    if relative == "." {
        return Some(base.to_string());
    }
    Some(format!("{}{}", base, relative))
}
