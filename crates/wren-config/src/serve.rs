//! Development server configuration types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Directory names that are never watched, in addition to `watch.ignore`.
pub const BUILTIN_IGNORES: &[&str] = &[".git", "node_modules", "dist", "build", ".cache"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Directory that is both served and watched.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub import_map: ImportMapConfig,

    #[serde(default)]
    pub reload: ReloadConfig,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            host: default_host(),
            port: default_port(),
            watch: WatchConfig::default(),
            cache: CacheConfig::default(),
            import_map: ImportMapConfig::default(),
            reload: ReloadConfig::default(),
        }
    }
}

impl ServeConfig {
    /// `host:port` as typed by the user.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn server_url(&self) -> String {
        format!("http://{}", self.address())
    }

    /// Built-in ignore names followed by the configured patterns.
    pub fn ignore_patterns(&self) -> Vec<String> {
        BUILTIN_IGNORES
            .iter()
            .map(|name| (*name).to_string())
            .chain(self.watch.ignore.iter().cloned())
            .collect()
    }

    /// The override file resolved against the root directory.
    pub fn override_file(&self) -> Option<PathBuf> {
        self.import_map.override_file.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                self.root.join(path)
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period after the last raw event before a batch is emitted.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Extra names or glob patterns (matched against root-relative paths).
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            ignore: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound on the summed size of cached transform output.
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,

    /// Interval between cache statistics log lines; 0 disables them.
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportMapConfig {
    #[serde(default = "default_true")]
    pub generate: bool,

    /// JSON file with `imports` and `scopes` merged over the generated map.
    #[serde(default)]
    pub override_file: Option<PathBuf>,

    /// Specifier to path entries applied after the override file.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

impl Default for ImportMapConfig {
    fn default() -> Self {
        Self {
            generate: true,
            override_file: None,
            overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReloadConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Messages buffered per browser connection before sends are dropped.
    #[serde(default = "default_client_buffer")]
    pub client_buffer: usize,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            client_buffer: default_client_buffer(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8000
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_max_size_bytes() -> u64 {
    500 * 1024 * 1024
}

fn default_stats_interval_secs() -> u64 {
    60
}

fn default_client_buffer() -> usize {
    32
}

fn default_true() -> bool {
    true
}
