//! Persisted user settings.
//!
//! A small key-value settings file (TOML) living next to the stored
//! documents. Components that need a flag receive a `Settings` value
//! instead of reaching into process-wide shared state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name of the settings file inside the storage directory.
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Whether the first-run welcome has already been shown.
    #[serde(default)]
    pub seen_welcome: bool,
}

impl Settings {
    /// Path of the settings file under `storage_dir`.
    pub fn path_in(storage_dir: &Path) -> PathBuf {
        storage_dir.join(SETTINGS_FILE)
    }

    /// Load settings from `storage_dir`. A missing file yields defaults;
    /// a malformed file is reported as `ConfigLoad`.
    pub fn load(storage_dir: &Path) -> Result<Self> {
        let path = Self::path_in(storage_dir);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::ConfigLoad(format!("Failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse settings: {e}")))
    }

    /// Persist the settings to `storage_dir`.
    pub fn save(&self, storage_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(storage_dir)?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigLoad(format!("Failed to serialize settings: {e}")))?;
        std::fs::write(Self::path_in(storage_dir), content)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert!(!settings.seen_welcome);
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let settings = Settings { seen_welcome: true };
        settings.save(dir.path()).unwrap();

        let loaded = Settings::load(dir.path()).unwrap();
        assert!(loaded.seen_welcome);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(Settings::path_in(dir.path()), "seen_welcome = \"yes\"").unwrap();
        assert!(Settings::load(dir.path()).is_err());
    }
}
