//! Which entry points a set of invalidated module paths affects.

use rustc_hash::FxHashSet;
use wren_cache::normalize_module_path;
use wren_importmap::ImportMap;

use crate::entry::EntryPoint;

/// Module paths an import of `specifier` from `entry` may load.
///
/// Relative specifiers resolve against the entry's directory, absolute ones against
/// the served root, and bare ones through the import map. Specifiers that end up on
/// another origin yield nothing. Every candidate is followed by its `.js`/`.ts`
/// sibling, since compiled modules are requested under one extension and cached
/// under the other.
pub fn import_candidates(
    entry: &EntryPoint,
    specifier: &str,
    import_map: &ImportMap,
) -> Vec<String> {
    let Some(resolved) = resolve_specifier(entry, specifier, import_map) else {
        return Vec::new();
    };
    let resolved = strip_query(&resolved);
    if resolved.is_empty() {
        return Vec::new();
    }

    let mut candidates = vec![resolved.clone()];
    if let Some(sibling) = swap_extension(&resolved) {
        candidates.push(sibling);
    }
    candidates
}

fn resolve_specifier(
    entry: &EntryPoint,
    specifier: &str,
    import_map: &ImportMap,
) -> Option<String> {
    if is_url(specifier) {
        return None;
    }
    if specifier.starts_with("./") || specifier.starts_with("../") {
        let dir = match entry.file.rfind('/') {
            Some(idx) => &entry.file[..idx],
            None => "",
        };
        return Some(normalize_module_path(&format!("{}/{}", dir, specifier)));
    }
    if specifier.starts_with('/') {
        if specifier.starts_with("//") {
            return None;
        }
        return Some(normalize_module_path(specifier));
    }

    let referrer = format!("/{}", entry.file);
    let target = import_map.resolve(specifier, Some(&referrer))?;
    if is_url(&target) || target.starts_with("//") {
        return None;
    }
    Some(normalize_module_path(&target))
}

fn is_url(specifier: &str) -> bool {
    url::Url::parse(specifier).is_ok_and(|url| !url.cannot_be_a_base() || url.scheme() == "data")
}

fn strip_query(path: &str) -> String {
    path.split(['?', '#']).next().unwrap_or_default().to_string()
}

fn swap_extension(path: &str) -> Option<String> {
    if let Some(stem) = path.strip_suffix(".js") {
        Some(format!("{}.ts", stem))
    } else {
        path.strip_suffix(".ts").map(|stem| format!("{}.js", stem))
    }
}

/// Whether `entry` itself, or any of its imports (one level, not re-parsed),
/// is in `invalidated`.
pub fn is_affected(
    entry: &EntryPoint,
    imports: &[String],
    import_map: &ImportMap,
    invalidated: &FxHashSet<String>,
) -> bool {
    if invalidated.contains(&entry.file) {
        return true;
    }
    imports.iter().any(|specifier| {
        import_candidates(entry, specifier, import_map)
            .iter()
            .any(|candidate| invalidated.contains(candidate))
    })
}
