use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fraction of a page's native size used for thumbnails.
pub const DEFAULT_THUMBNAIL_SCALE: f32 = 0.1;

/// Scale used when rasterizing pages for a rebuild (1.0 = native size,
/// one pixel per PDF point, so rebuilt pages keep their dimensions).
pub const DEFAULT_RENDER_SCALE: f32 = 1.0;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the stored PDF documents.
    /// Defaults to the XDG data dir (`~/.local/share/docshelf`).
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    /// Thumbnail scale as a fraction of the page's native size
    #[serde(default = "default_thumbnail_scale")]
    pub thumbnail_scale: f32,

    /// Scale factor for page rasterization during rebuilds
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,
}

const fn default_thumbnail_scale() -> f32 {
    DEFAULT_THUMBNAIL_SCALE
}

const fn default_render_scale() -> f32 {
    DEFAULT_RENDER_SCALE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            thumbnail_scale: default_thumbnail_scale(),
            render_scale: default_render_scale(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}"))
        })
    }

    /// Load from default locations (~/.config/docshelf/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("docshelf").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        // Return defaults
        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Resolve the storage directory, falling back to the XDG default.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(crate::util::default_storage_dir)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.storage_dir.is_none());
        assert!((config.thumbnail_scale - 0.1).abs() < f32::EPSILON);
        assert!((config.render_scale - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_partial_config() {
        let config: AppConfig = toml::from_str("thumbnail_scale = 0.25").unwrap();
        assert!((config.thumbnail_scale - 0.25).abs() < f32::EPSILON);
        assert!((config.render_scale - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_explicit_storage_dir_wins() {
        let config: AppConfig = toml::from_str("storage_dir = \"/tmp/shelf\"").unwrap();
        assert_eq!(config.storage_dir(), PathBuf::from("/tmp/shelf"));
    }
}
