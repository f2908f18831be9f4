//! `cache_metadata.json`: last update time and file per cache kind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CacheError, CacheKind};

/// Metadata for one cache kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// When the cache was last written.
    pub last_updated: DateTime<Utc>,
    /// Where the cache document lives.
    pub file_path: PathBuf,
}

/// Metadata for every kind that has been written.
pub type CacheMetadata = BTreeMap<CacheKind, MetadataEntry>;

/// Reads the metadata file; missing or unreadable files yield an empty map.
#[must_use]
pub fn read_metadata(path: &Path) -> CacheMetadata {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Cannot read cache metadata {}: {e}", path.display());
            }
            return CacheMetadata::new();
        }
    };

    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        log::warn!("Ignoring corrupt cache metadata {}: {e}", path.display());
        CacheMetadata::new()
    })
}

/// Records that `kind` was written to `file_path` at `timestamp`.
///
/// # Errors
///
/// Returns [`CacheError`] if the metadata file cannot be written.
pub fn update_metadata(
    path: &Path,
    kind: CacheKind,
    file_path: &Path,
    timestamp: DateTime<Utc>,
) -> Result<(), CacheError> {
    let mut metadata = read_metadata(path);
    metadata.insert(
        kind,
        MetadataEntry {
            last_updated: timestamp,
            file_path: file_path.to_path_buf(),
        },
    );

    std::fs::write(path, serde_json::to_vec_pretty(&metadata)?)?;
    Ok(())
}
