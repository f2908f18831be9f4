//! The on-disk cache document shape and its read/write helpers.

use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::CacheError;

/// Version written into every document.
pub const CACHE_VERSION: &str = "1.0";

/// A whole-file cache document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheDocument<T> {
    /// When the document was written.
    pub timestamp: DateTime<Utc>,
    /// Source file fingerprint; absent for the geocode cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_hash: Option<String>,
    /// Cached data.
    pub payload: T,
    /// Number of entries in `payload`.
    pub total_entries: usize,
    /// Format version.
    pub cache_version: String,
}

impl<T> CacheDocument<T> {
    /// Wraps `payload` stamped at `timestamp`.
    pub fn new(
        payload: T,
        total_entries: usize,
        data_hash: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            data_hash,
            payload,
            total_entries,
            cache_version: CACHE_VERSION.to_string(),
        }
    }

    /// Whether the document is no older than `max_age` at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: TimeDelta) -> bool {
        now.signed_duration_since(self.timestamp) <= max_age
    }
}

/// Serializes `document` to a sibling temp file and renames it over
/// `path`.
///
/// # Errors
///
/// Returns [`CacheError`] if serialization or any file operation fails.
pub fn write_document<T: Serialize>(
    path: &Path,
    document: &CacheDocument<T>,
) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let json = serde_json::to_vec_pretty(document)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;

    Ok(())
}

/// Reads a document, treating a missing file as `Ok(None)`.
///
/// # Errors
///
/// Returns [`CacheError`] if the file exists but cannot be read or
/// parsed.
pub fn try_read_document<T: DeserializeOwned>(
    path: &Path,
) -> Result<Option<CacheDocument<T>>, CacheError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Reads a document; any failure is logged and becomes a miss.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Option<CacheDocument<T>> {
    match try_read_document(path) {
        Ok(document) => document,
        Err(e) => {
            log::warn!("Ignoring unreadable cache {}: {e}", path.display());
            None
        }
    }
}
