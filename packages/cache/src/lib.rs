#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! File-backed caches for the parking safety pipeline.
//!
//! Two JSON documents live in one cache directory:
//!
//! - `safety_analysis_cache.json`: the full per-location analysis, valid
//!   while it is younger than a max age and the tracked source files are
//!   unchanged (see [`fingerprint`]).
//! - `geocode_cache.json`: address to coordinates, valid for a number of
//!   days and merged additively.
//!
//! `cache_metadata.json` records when each kind was last written.

pub mod analysis;
pub mod document;
pub mod fingerprint;
pub mod geocode;
pub mod metadata;
pub mod paths;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use analysis::AnalysisCache;
pub use geocode::{GeocodeCache, GeocodeMap, MergeStats};

/// Errors that can occur while reading or writing cache files.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The kinds of cache document.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CacheKind {
    /// Per-location safety analysis.
    SafetyAnalysis,
    /// Geocoded addresses.
    GeocodedAddresses,
}

impl CacheKind {
    /// Every cache kind.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::SafetyAnalysis, Self::GeocodedAddresses]
    }

    /// Document file name inside the cache directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::SafetyAnalysis => paths::SAFETY_ANALYSIS_FILE,
            Self::GeocodedAddresses => paths::GEOCODE_FILE,
        }
    }
}

/// Status of one cache document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntryStatus {
    /// Which cache.
    pub kind: CacheKind,
    /// Whether the document exists.
    pub exists: bool,
    /// When the document was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Number of entries in the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_entries: Option<usize>,
    /// Size of the document in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Set when the document exists but cannot be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status of every cache document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    /// The cache directory.
    pub cache_dir: PathBuf,
    /// One entry per [`CacheKind`].
    pub entries: Vec<CacheEntryStatus>,
}

/// Entry point for every cache in one directory.
#[derive(Debug, Clone)]
pub struct CacheManager {
    dir: PathBuf,
}

impl CacheManager {
    /// Manages the caches inside `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Manages the caches in the directory named by
    /// `PARKING_SAFETY_CACHE_DIR`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(paths::cache_dir_from_env())
    }

    /// The cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn metadata_path(&self) -> PathBuf {
        self.dir.join(paths::METADATA_FILE)
    }

    fn document_path(&self, kind: CacheKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// The safety analysis cache.
    #[must_use]
    pub fn analysis(&self) -> AnalysisCache {
        AnalysisCache::new(
            self.document_path(CacheKind::SafetyAnalysis),
            self.metadata_path(),
        )
    }

    /// The geocode cache.
    #[must_use]
    pub fn geocode(&self) -> GeocodeCache {
        GeocodeCache::new(
            self.document_path(CacheKind::GeocodedAddresses),
            self.metadata_path(),
        )
    }

    /// Reports existence, age, entry count and size of every document.
    #[must_use]
    pub fn status(&self) -> CacheStatus {
        let entries = CacheKind::all()
            .iter()
            .map(|&kind| self.entry_status(kind))
            .collect();

        CacheStatus {
            cache_dir: self.dir.clone(),
            entries,
        }
    }

    fn entry_status(&self, kind: CacheKind) -> CacheEntryStatus {
        let path = self.document_path(kind);
        let mut status = CacheEntryStatus {
            kind,
            exists: path.exists(),
            last_updated: None,
            total_entries: None,
            file_size: None,
            error: None,
        };

        if !status.exists {
            return status;
        }

        status.file_size = std::fs::metadata(&path).ok().map(|m| m.len());

        match document::try_read_document::<serde_json::Value>(&path) {
            Ok(Some(document)) => {
                status.last_updated = Some(document.timestamp);
                status.total_entries = Some(document.total_entries);
            }
            Ok(None) => status.exists = false,
            Err(e) => {
                log::warn!("Cannot read cache {}: {e}", path.display());
                status.error = Some("Cannot read cache".to_string());
            }
        }

        status
    }

    /// Deletes one cache document, or every document and the metadata
    /// file when `kind` is `None`. Returns the kinds that were removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if an existing file cannot be removed.
    pub fn clear(&self, kind: Option<CacheKind>) -> Result<Vec<CacheKind>, CacheError> {
        let kinds = kind.map_or_else(|| CacheKind::all().to_vec(), |k| vec![k]);
        let mut cleared = Vec::new();

        for kind in kinds {
            let path = self.document_path(kind);
            if remove_if_exists(&path)? {
                log::info!("Cleared {kind} cache");
                cleared.push(kind);
            }
        }

        if kind.is_none() {
            remove_if_exists(&self.metadata_path())?;
        }

        Ok(cleared)
    }

    /// Copies the geocode cache to a timestamped backup next to it.
    /// Returns `None` when there is no geocode cache to back up.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the copy fails.
    pub fn backup_geocode(&self) -> Result<Option<PathBuf>, CacheError> {
        self.backup_geocode_at(Utc::now())
    }

    /// [`Self::backup_geocode`] with the backup stamped at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the copy fails.
    pub fn backup_geocode_at(&self, now: DateTime<Utc>) -> Result<Option<PathBuf>, CacheError> {
        let source = self.document_path(CacheKind::GeocodedAddresses);
        if !source.exists() {
            log::warn!("No geocode cache to back up");
            return Ok(None);
        }

        let stamp = now.format("%Y%m%d_%H%M%S").to_string();
        let backup = self.dir.join(paths::geocode_backup_file(&stamp));
        std::fs::copy(&source, &backup)?;

        log::info!("Geocode cache backed up to {}", backup.display());
        Ok(Some(backup))
    }
}

fn remove_if_exists(path: &Path) -> Result<bool, CacheError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::str::FromStr;

    use chrono::TimeZone;
    use parking_safety_parking_models::Coordinates;

    use super::*;

    fn seeded() -> (tempfile::TempDir, CacheManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = CacheManager::new(dir.path().join("cache"));

        manager
            .geocode()
            .save(&GeocodeMap::from([(
                "KING ST N".to_string(),
                Coordinates::new(43.46, -80.52),
            )]))
            .unwrap();
        manager
            .analysis()
            .save(&BTreeMap::from([("KING ST N".to_string(), 0.5_f64)]), &[])
            .unwrap();

        (dir, manager)
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(CacheKind::SafetyAnalysis.to_string(), "safety_analysis");
        assert_eq!(
            CacheKind::from_str("geocoded_addresses").unwrap(),
            CacheKind::GeocodedAddresses
        );
    }

    #[test]
    fn status_of_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let status = CacheManager::new(dir.path()).status();
        assert_eq!(status.entries.len(), 2);
        assert!(status.entries.iter().all(|e| !e.exists));
    }

    #[test]
    fn status_reports_entries_and_size() {
        let (_dir, manager) = seeded();
        let status = manager.status();

        for entry in &status.entries {
            assert!(entry.exists);
            assert_eq!(entry.total_entries, Some(1));
            assert!(entry.file_size.unwrap() > 0);
            assert!(entry.last_updated.is_some());
        }
    }

    #[test]
    fn status_flags_unreadable_document() {
        let (_dir, manager) = seeded();
        std::fs::write(manager.geocode().path(), "nope").unwrap();

        let status = manager.status();
        let geocode = status
            .entries
            .iter()
            .find(|e| e.kind == CacheKind::GeocodedAddresses)
            .unwrap();
        assert_eq!(geocode.error.as_deref(), Some("Cannot read cache"));
    }

    #[test]
    fn clear_one_kind() {
        let (_dir, manager) = seeded();
        let cleared = manager.clear(Some(CacheKind::SafetyAnalysis)).unwrap();

        assert_eq!(cleared, vec![CacheKind::SafetyAnalysis]);
        assert!(!manager.analysis().path().exists());
        assert!(manager.geocode().path().exists());
        assert!(manager.dir().join(paths::METADATA_FILE).exists());
    }

    #[test]
    fn clear_all_removes_metadata() {
        let (_dir, manager) = seeded();
        let cleared = manager.clear(None).unwrap();

        assert_eq!(cleared.len(), 2);
        assert!(!manager.dir().join(paths::METADATA_FILE).exists());
        assert!(manager.clear(None).unwrap().is_empty());
    }

    #[test]
    fn backup_copies_geocode_cache() {
        let (_dir, manager) = seeded();
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let backup = manager.backup_geocode_at(now).unwrap().unwrap();

        assert_eq!(
            backup.file_name().unwrap().to_str().unwrap(),
            "geocode_cache_backup_20240309_140507.json"
        );
        assert_eq!(
            std::fs::read(&backup).unwrap(),
            std::fs::read(manager.geocode().path()).unwrap()
        );
    }

    #[test]
    fn backup_without_cache_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CacheManager::new(dir.path());
        assert!(manager.backup_geocode().unwrap().is_none());
    }
}
