use std::path::{Path, PathBuf};

use wren_config::{ConfigOverrides, ImportMapOverrides, ServeConfig};
use wren_importmap::{GenerateOptions, ImportMap, generate};

use crate::cli::ConfigArgs;
use crate::error::{CliError, Result, ResultExt};

/// Directory config is discovered in: ROOT when given, otherwise the working directory.
pub(crate) fn project_dir(args: &ConfigArgs) -> Result<PathBuf> {
    match &args.root {
        Some(root) => Ok(root.clone()),
        None => std::env::current_dir().context("Failed to read the current directory"),
    }
}

/// Overrides every command derives from [`ConfigArgs`].
pub(crate) fn config_overrides(args: &ConfigArgs) -> ConfigOverrides {
    ConfigOverrides {
        import_map: ImportMapOverrides {
            override_file: args.import_map_override.clone(),
            overrides: args.imports.iter().cloned().collect(),
            ..ImportMapOverrides::default()
        },
        ..ConfigOverrides::default()
    }
}

/// Layer and validate configuration, with the root made canonical.
pub(crate) fn load_config(
    project_dir: &Path,
    args: &ConfigArgs,
    overrides: &ConfigOverrides,
) -> Result<ServeConfig> {
    let mut config = ServeConfig::load(project_dir, args.config.as_deref(), overrides)?;
    config.validate()?;
    config.root = config.root.canonicalize().with_path(&config.root)?;
    Ok(config)
}

pub(crate) fn generate_options(config: &ServeConfig) -> GenerateOptions {
    let mut overrides = ImportMap::new();
    for (specifier, path) in &config.import_map.overrides {
        overrides.insert(specifier.clone(), path.clone());
    }
    GenerateOptions {
        override_file: config.override_file(),
        overrides,
    }
}

/// The import map to serve at startup.
///
/// With generation turned off only the override file and configured entries apply.
pub(crate) fn initial_import_map(
    config: &ServeConfig,
    options: &GenerateOptions,
) -> Result<ImportMap> {
    if config.import_map.generate {
        return Ok(generate(&config.root, options)?);
    }

    let mut map = ImportMap::new();
    if let Some(path) = &options.override_file {
        let contents = std::fs::read_to_string(path).with_path(path)?;
        let file: ImportMap = serde_json::from_str(&contents)
            .map_err(|e| {
                CliError::InvalidArgument(format!(
                    "invalid import map in {}: {}",
                    path.display(),
                    e
                ))
            })
            .with_hint(r#"Expected {"imports": {...}} with an optional "scopes" object"#)?;
        map.merge(file, &path.display().to_string());
    }
    map.merge(options.overrides.clone(), "configuration");
    Ok(map)
}
