//! Safety analysis cache keyed by a fingerprint of the source files.
//!
//! A document is served only while it is younger than the requested max
//! age and the fingerprint of the tracked files still matches the one it
//! was saved with.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::document::{CacheDocument, read_document, write_document};
use crate::fingerprint::fingerprint;
use crate::metadata::update_metadata;
use crate::{CacheError, CacheKind};

/// Default maximum age of a cached analysis.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

/// Handle to the safety analysis cache document.
#[derive(Debug, Clone)]
pub struct AnalysisCache {
    path: PathBuf,
    metadata_path: PathBuf,
}

impl AnalysisCache {
    /// Creates a handle for the document at `path`, recording updates in
    /// `metadata_path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, metadata_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            metadata_path: metadata_path.into(),
        }
    }

    /// Location of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves `analysis` stamped with the current time and the fingerprint
    /// of `source_files`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the document cannot be written.
    pub fn save<K, V>(
        &self,
        analysis: &BTreeMap<K, V>,
        source_files: &[PathBuf],
    ) -> Result<(), CacheError>
    where
        K: Serialize + Ord,
        V: Serialize,
    {
        self.save_at(analysis, source_files, Utc::now())
    }

    /// Saves `analysis` stamped at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the document cannot be written.
    pub fn save_at<K, V>(
        &self,
        analysis: &BTreeMap<K, V>,
        source_files: &[PathBuf],
        now: DateTime<Utc>,
    ) -> Result<(), CacheError>
    where
        K: Serialize + Ord,
        V: Serialize,
    {
        let document = CacheDocument::new(
            analysis,
            analysis.len(),
            Some(fingerprint(source_files)),
            now,
        );
        write_document(&self.path, &document)?;
        update_metadata(
            &self.metadata_path,
            CacheKind::SafetyAnalysis,
            &self.path,
            now,
        )?;

        log::info!("Safety analysis cached: {} locations", analysis.len());
        Ok(())
    }

    /// Loads the cached analysis if it is fresh and matches the current
    /// fingerprint of `source_files`.
    #[must_use]
    pub fn load<K, V>(&self, source_files: &[PathBuf], max_age: TimeDelta) -> Option<BTreeMap<K, V>>
    where
        K: DeserializeOwned + Ord,
        V: DeserializeOwned,
    {
        self.load_at(source_files, max_age, Utc::now())
    }

    /// [`Self::load`] evaluated at `now`.
    #[must_use]
    pub fn load_at<K, V>(
        &self,
        source_files: &[PathBuf],
        max_age: TimeDelta,
        now: DateTime<Utc>,
    ) -> Option<BTreeMap<K, V>>
    where
        K: DeserializeOwned + Ord,
        V: DeserializeOwned,
    {
        let Some(document) = read_document::<BTreeMap<K, V>>(&self.path) else {
            log::debug!("No safety analysis cache at {}", self.path.display());
            return None;
        };

        if !document.is_fresh(now, max_age) {
            log::info!(
                "Safety analysis cache expired (older than {} hours)",
                max_age.num_hours()
            );
            return None;
        }

        let current = fingerprint(source_files);
        if document.data_hash.as_deref() != Some(current.as_str()) {
            log::info!("Source files changed, safety analysis cache invalid");
            return None;
        }

        log::info!(
            "Loaded safety analysis from cache: {} locations",
            document.total_entries
        );
        Some(document.payload)
    }
}
