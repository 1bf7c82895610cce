//! Utility functions shared across the crate.

use std::path::{Path, PathBuf};

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Get the user's data directory following XDG conventions.
///
/// Returns `$XDG_DATA_HOME` if set, otherwise `$HOME/.local/share`.
pub fn data_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".local").join("share"))
        })
}

/// Default directory for stored PDF documents.
pub fn default_storage_dir() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| PathBuf::from(".docshelf"))
        .join("docshelf")
}

/// Pick an unused output path of the form `<prefix>_<unix-seconds>.pdf`.
///
/// Stored files carry no sidecar metadata; the timestamp in the name is
/// purely to keep names unique and human-sortable. Two writes within the
/// same second would collide, so the seconds value is bumped until free.
pub fn fresh_pdf_path(dir: &Path, prefix: &str) -> PathBuf {
    let mut secs = chrono::Utc::now().timestamp();
    loop {
        let candidate = dir.join(format!("{prefix}_{secs}.pdf"));
        if !candidate.exists() {
            return candidate;
        }
        secs += 1;
    }
}
