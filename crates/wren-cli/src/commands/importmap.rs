//! `wren importmap`: print the import map `serve` would use.

use crate::cli::ImportmapArgs;
use crate::commands::utils;
use crate::error::Result;

pub async fn execute(args: ImportmapArgs) -> Result<()> {
    let json = render(&args)?;
    println!("{}", json);
    Ok(())
}

/// Generate the map for `args` and serialize it.
pub fn render(args: &ImportmapArgs) -> Result<String> {
    let project_dir = utils::project_dir(&args.config)?;
    let overrides = utils::config_overrides(&args.config);
    let config = utils::load_config(&project_dir, &args.config, &overrides)?;

    let options = utils::generate_options(&config);
    let map = utils::initial_import_map(&config, &options)?;
    tracing::debug!(
        imports = map.imports.len(),
        scopes = map.scopes.len(),
        "Generated import map"
    );

    Ok(if args.compact {
        map.to_json()
    } else {
        map.to_json_pretty()
    })
}
