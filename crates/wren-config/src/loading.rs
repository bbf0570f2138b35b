use crate::discovery::{ConfigDiscovery, read_config_value};
use crate::error::{ConfigError, Result};
use crate::serve::ServeConfig;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Values supplied on the command line. `None` and empty fields leave lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub watch: WatchOverrides,
    pub cache: CacheOverrides,
    pub import_map: ImportMapOverrides,
    pub reload: ReloadOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WatchOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    /// Appended to the ignore list from lower layers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportMapOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReloadOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl ServeConfig {
    /// Load configuration from multiple sources.
    /// Priority: CLI args > environment variables > config file > defaults
    ///
    /// `project_dir` is where the config file is searched for unless `config_path`
    /// names one explicitly. A relative `root` is resolved against `project_dir`.
    pub fn load(
        project_dir: &Path,
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::InvalidValue {
                    field: "config".to_string(),
                    hint: format!("config file not found: {}", path.display()),
                });
            }
            Some(path) => Some(path.to_path_buf()),
            None => ConfigDiscovery::new(project_dir).find(),
        };

        if let Some(path) = &config_file {
            tracing::debug!("Loading config from {}", path.display());
            figment = figment.merge(Serialized::defaults(read_config_value(path)?));
        }

        // WREN_PORT, WREN_WATCH__DEBOUNCE_MS, ...
        figment = figment.merge(Env::prefixed("WREN_").split("__"));

        // Arrays from the CLI extend lower layers instead of replacing them.
        figment = figment.admerge(Serialized::defaults(overrides));

        let mut config: Self = figment.extract().map_err(|e| ConfigError::InvalidValue {
            field: "configuration".to_string(),
            hint: e.to_string(),
        })?;

        if config.root.is_relative() {
            config.root = project_dir.join(&config.root);
        }

        Ok(config)
    }
}
