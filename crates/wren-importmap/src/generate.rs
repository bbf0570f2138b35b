//! Import map generation from the package tree under a root directory.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

use crate::error::{ImportMapError, Result};
use crate::exports::package_entries;
use crate::map::{ImportMap, SpecifierMap};
use crate::package_json::PackageJson;
use crate::workspace::{
    WorkspacePackage, discover_workspace_packages, find_workspace_root, relative_slash_path,
};

/// Inputs beyond the package tree itself.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// JSON file with `imports` and `scopes`, merged over the generated map.
    pub override_file: Option<PathBuf>,
    /// Applied last, over the override file.
    pub overrides: ImportMap,
}

/// Build the import map for the project rooted at `root`.
///
/// A missing root package.json yields an empty map (overrides still apply). When
/// `root` is a subdirectory of a workspace, resolution runs from the workspace root
/// so installed dependencies are found and served from there.
///
/// # Errors
///
/// Fails if the root package.json is unreadable or invalid, or the override file is
/// missing or invalid. Problems with individual dependencies only produce warnings.
pub fn generate(root: &Path, options: &GenerateOptions) -> Result<ImportMap> {
    let root = std::path::absolute(root).map_err(|source| ImportMapError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut import_map = match PackageJson::from_dir(&root)? {
        None => {
            tracing::debug!(
                root = %root.display(),
                "No package.json, starting from an empty import map"
            );
            ImportMap::new()
        }
        Some(root_pkg) => {
            let resolution_root = find_workspace_root(&root);
            if resolution_root != root {
                tracing::debug!(
                    workspace_root = %resolution_root.display(),
                    "Detected workspace subdirectory, using workspace root"
                );
                match PackageJson::from_dir(&resolution_root)? {
                    Some(workspace_pkg) => Resolver::new(&resolution_root).run(&workspace_pkg),
                    None => Resolver::new(&resolution_root).run(&root_pkg),
                }
            } else {
                Resolver::new(&root).run(&root_pkg)
            }
        }
    };

    if let Some(path) = &options.override_file {
        let path = if path.is_absolute() {
            path.clone()
        } else {
            root.join(path)
        };
        let file_map = read_override_file(&path)?;
        import_map.merge(file_map, &path.display().to_string());
    }
    import_map.merge(options.overrides.clone(), "configuration");

    tracing::debug!(
        imports = import_map.imports.len(),
        scopes = import_map.scopes.len(),
        "Generated import map"
    );
    Ok(import_map)
}

fn read_override_file(path: &Path) -> Result<ImportMap> {
    if !path.is_file() {
        return Err(ImportMapError::OverrideNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ImportMapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ImportMapError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// A package located on disk together with the URL prefix it is served under.
struct Located {
    prefix: String,
    package: PackageJson,
}

struct Resolver<'a> {
    root: &'a Path,
    members: FxHashMap<String, WorkspacePackage>,
    /// Parsed package.json per directory; `None` when unreadable.
    packages: FxHashMap<PathBuf, Option<PackageJson>>,
}

impl<'a> Resolver<'a> {
    fn new(root: &'a Path) -> Self {
        Self {
            root,
            members: FxHashMap::default(),
            packages: FxHashMap::default(),
        }
    }

    fn run(mut self, root_pkg: &PackageJson) -> ImportMap {
        let mut import_map = ImportMap::new();

        let members = discover_workspace_packages(self.root, root_pkg);
        tracing::debug!(count = members.len(), "Discovered workspace packages");

        if !root_pkg.is_workspace_root() && root_pkg.has_entry_point() {
            if let Some(name) = &root_pkg.name {
                let entries =
                    package_entries(name, root_pkg.exports.as_ref(), root_pkg.main.as_deref(), "/");
                insert_missing(&mut import_map.imports, entries);
            }
        }

        for member in &members {
            let prefix = self.prefix_for(&member.root_path);
            let entries = package_entries(
                &member.name,
                member.package.exports.as_ref(),
                member.package.main.as_deref(),
                &prefix,
            );
            insert_missing(&mut import_map.imports, entries);
        }

        // (dependency name, directory to search from)
        let mut direct: Vec<(String, PathBuf)> = root_pkg
            .dependencies
            .keys()
            .map(|name| (name.clone(), self.root.to_path_buf()))
            .collect();
        for member in &members {
            direct.extend(
                member
                    .dependencies
                    .iter()
                    .map(|name| (name.clone(), member.root_path.clone())),
            );
        }

        self.members = members
            .into_iter()
            .map(|member| (member.name.clone(), member))
            .collect();

        let mut queue: VecDeque<PathBuf> = VecDeque::new();
        for (name, from) in direct {
            if self.members.contains_key(&name) {
                continue;
            }
            let Some(dir) = self.locate(&name, &from) else {
                tracing::warn!(
                    dependency = %name,
                    "Dependency not installed, omitting from import map"
                );
                continue;
            };
            let Some(located) = self.load(&dir) else {
                continue;
            };
            let entries = package_entries(
                &name,
                located.package.exports.as_ref(),
                located.package.main.as_deref(),
                &located.prefix,
            );
            insert_missing(&mut import_map.imports, entries);
            queue.push_back(dir);
        }

        let mut member_dirs: Vec<PathBuf> = self
            .members
            .values()
            .map(|m| m.root_path.clone())
            .collect();
        member_dirs.sort();
        queue.extend(member_dirs);

        import_map.scopes = self.build_scopes(queue);
        import_map
    }

    /// Breadth-first walk over the dependency tree, one scope per package that has
    /// resolvable dependencies. Each package directory is visited once.
    fn build_scopes(
        &mut self,
        mut queue: VecDeque<PathBuf>,
    ) -> BTreeMap<String, SpecifierMap> {
        let mut scopes = BTreeMap::new();
        let mut visited: FxHashSet<PathBuf> = FxHashSet::default();

        while let Some(dir) = queue.pop_front() {
            if !visited.insert(dir.clone()) {
                continue;
            }
            let Some(located) = self.load(&dir) else {
                continue;
            };

            let mut scope = SpecifierMap::new();
            for name in located.package.dependencies.keys() {
                if let Some(member) = self.members.get(name) {
                    let prefix = self.prefix_for(&member.root_path);
                    let entries = package_entries(
                        name,
                        member.package.exports.as_ref(),
                        member.package.main.as_deref(),
                        &prefix,
                    );
                    insert_missing(&mut scope, entries);
                    continue;
                }

                let Some(dep_dir) = self.locate(name, &dir) else {
                    tracing::debug!(
                        dependency = %name,
                        from = %located.prefix,
                        "Transitive dependency not installed"
                    );
                    continue;
                };
                let Some(dep) = self.load(&dep_dir) else {
                    continue;
                };
                let entries = package_entries(
                    name,
                    dep.package.exports.as_ref(),
                    dep.package.main.as_deref(),
                    &dep.prefix,
                );
                insert_missing(&mut scope, entries);
                if !visited.contains(&dep_dir) {
                    queue.push_back(dep_dir);
                }
            }

            // The root's own dependencies are already the top-level imports.
            if !scope.is_empty() && located.prefix != "/" {
                scopes.insert(located.prefix, scope);
            }
        }

        scopes
    }

    /// Find `name` in `node_modules`, walking up from `from` to the resolution root.
    fn locate(&self, name: &str, from: &Path) -> Option<PathBuf> {
        let mut dir = from;
        loop {
            let candidate = dir.join("node_modules").join(name);
            if candidate.join("package.json").is_file() {
                return Some(candidate);
            }
            if dir == self.root {
                return None;
            }
            dir = dir.parent()?;
        }
    }

    fn load(&mut self, dir: &Path) -> Option<Located> {
        let package = self
            .packages
            .entry(dir.to_path_buf())
            .or_insert_with(|| match PackageJson::from_dir(dir) {
                Ok(Some(pkg)) => Some(pkg),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!("Skipping package: {}", e);
                    None
                }
            })
            .clone()?;
        Some(Located {
            prefix: self.prefix_for(dir),
            package,
        })
    }

    /// Served URL prefix for a directory under the resolution root.
    fn prefix_for(&self, dir: &Path) -> String {
        let relative = relative_slash_path(self.root, dir);
        if relative.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", relative)
        }
    }
}

/// Earlier registrations take priority.
fn insert_missing(target: &mut SpecifierMap, entries: SpecifierMap) {
    for (specifier, path) in entries {
        target.entry(specifier).or_insert(path);
    }
}
