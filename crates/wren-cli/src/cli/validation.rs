/// Parse an `--import SPECIFIER=PATH` override.
///
/// The specifier must be non-empty and free of control characters; the path must
/// be non-empty. Whitespace around either side is trimmed.
///
/// # Errors
///
/// Returns a message suitable for clap's error output.
pub fn parse_import_override(s: &str) -> Result<(String, String), String> {
    let Some((specifier, path)) = s.split_once('=') else {
        return Err(format!("Expected SPECIFIER=PATH, got '{}'", s));
    };
    let specifier = specifier.trim();
    let path = path.trim();

    if specifier.is_empty() {
        return Err("Import specifier cannot be empty".to_string());
    }
    if specifier.chars().any(char::is_control) {
        return Err(format!(
            "Import specifier contains control characters: '{}'",
            specifier.escape_debug()
        ));
    }
    if path.is_empty() {
        return Err(format!("Import path for '{}' cannot be empty", specifier));
    }

    Ok((specifier.to_string(), path.to_string()))
}
