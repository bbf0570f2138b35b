//! The subset of package.json that import map generation reads.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ImportMapError, Result};

/// Maximum allowed size for package.json files (10MB)
const MAX_PACKAGE_JSON_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    /// Runtime dependencies; these are the packages that get import map entries.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub workspaces: Option<Workspaces>,
    /// Kept as raw JSON; interpreted by the export resolver.
    #[serde(default)]
    pub exports: Option<Value>,
    pub main: Option<String>,
    /// File path this was loaded from
    #[serde(skip)]
    pub path: PathBuf,
}

/// `"workspaces": [...]` or the `{"packages": [...]}` object form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Workspaces {
    Patterns(Vec<String>),
    Config {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl PackageJson {
    /// Load and parse a package.json file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|source| ImportMapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if metadata.len() > MAX_PACKAGE_JSON_SIZE {
            return Err(ImportMapError::Malformed {
                path: path.to_path_buf(),
                message: format!(
                    "package.json exceeds maximum size of {}MB",
                    MAX_PACKAGE_JSON_SIZE / 1024 / 1024
                ),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| ImportMapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut pkg: PackageJson =
            serde_json::from_str(&content).map_err(|source| ImportMapError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        pkg.path = path.to_path_buf();
        Ok(pkg)
    }

    /// Load `dir/package.json` if it exists.
    pub fn from_dir(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join("package.json");
        if !path.is_file() {
            return Ok(None);
        }
        Self::from_path(&path).map(Some)
    }

    /// Declared workspace glob patterns; empty when this is not a workspace root.
    pub fn workspace_patterns(&self) -> &[String] {
        match &self.workspaces {
            Some(Workspaces::Patterns(patterns)) => patterns,
            Some(Workspaces::Config { packages }) => packages,
            None => &[],
        }
    }

    pub fn is_workspace_root(&self) -> bool {
        self.workspaces.is_some()
    }

    /// Whether the package declares anything importable by name.
    pub fn has_entry_point(&self) -> bool {
        self.exports.is_some() || self.main.is_some()
    }

    /// Directory containing this package.json.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }
}
