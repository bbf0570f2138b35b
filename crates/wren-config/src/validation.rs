//! Checks run once a configuration has been fully layered.

use crate::error::{ConfigError, Result};
use crate::serve::ServeConfig;

const MAX_DEBOUNCE_MS: u64 = 10_000;

impl ServeConfig {
    /// Validate values and the filesystem locations they point at.
    pub fn validate(&self) -> Result<()> {
        if !self.root.exists() {
            return Err(ConfigError::RootNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ConfigError::RootNotDirectory(self.root.clone()));
        }

        if self.watch.debounce_ms == 0 || self.watch.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::InvalidValue {
                field: "watch.debounce_ms".to_string(),
                hint: format!("expected 1..={}, got {}", MAX_DEBOUNCE_MS, self.watch.debounce_ms),
            });
        }

        if self.cache.max_size_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_size_bytes".to_string(),
                hint: "cache capacity must be greater than zero".to_string(),
            });
        }

        if self.reload.client_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reload.client_buffer".to_string(),
                hint: "per-connection buffer must hold at least one message".to_string(),
            });
        }

        if let Some(path) = self.override_file() {
            if !path.is_file() {
                return Err(ConfigError::OverrideFileNotFound(path));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> ServeConfig {
        ServeConfig {
            root: dir.path().to_path_buf(),
            ..ServeConfig::default()
        }
    }

    #[test]
    fn defaults_are_valid_for_existing_root() {
        let dir = TempDir::new().unwrap();
        assert!(config_in(&dir).validate().is_ok());
    }

    #[test]
    fn missing_root_is_rejected() {
        let config = ServeConfig {
            root: PathBuf::from("/definitely/not/here"),
            ..ServeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::RootNotFound(_))));
    }

    #[test]
    fn zero_debounce_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.watch.debounce_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "watch.debounce_ms"
        ));
    }

    #[test]
    fn missing_override_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.import_map.override_file = Some(PathBuf::from("importmap.json"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OverrideFileNotFound(_))
        ));

        std::fs::write(dir.path().join("importmap.json"), "{}").unwrap();
        assert!(config.validate().is_ok());
    }
}
