#![allow(clippy::module_name_repetitions)]
//! Canonical file names inside the cache directory.

use std::path::{Path, PathBuf};

/// Environment variable naming the cache directory.
pub const CACHE_DIR_ENV: &str = "PARKING_SAFETY_CACHE_DIR";

/// Cache directory used when [`CACHE_DIR_ENV`] is unset.
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Safety analysis document.
pub const SAFETY_ANALYSIS_FILE: &str = "safety_analysis_cache.json";

/// Geocoded addresses document.
pub const GEOCODE_FILE: &str = "geocode_cache.json";

/// Per-kind last-update metadata.
pub const METADATA_FILE: &str = "cache_metadata.json";

/// Resolves the cache directory from `PARKING_SAFETY_CACHE_DIR`, falling
/// back to `cache`.
#[must_use]
pub fn cache_dir_from_env() -> PathBuf {
    std::env::var(CACHE_DIR_ENV)
        .map_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR), PathBuf::from)
}

/// Name of a timestamped geocode cache backup.
#[must_use]
pub fn geocode_backup_file(stamp: &str) -> String {
    format!("geocode_cache_backup_{stamp}.json")
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
