//! Persistent address-to-coordinate cache.
//!
//! Unlike the analysis cache this document carries no fingerprint, and
//! coordinates do not go stale with the source files. Readers either take
//! the whole map regardless of age ([`GeocodeCache::load_any`]) or bound it
//! with their own max age in days ([`GeocodeCache::load`]). Updates are
//! merged additively so previously resolved addresses survive later runs,
//! and every update re-stamps the document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use parking_safety_parking_models::Coordinates;

use crate::document::{CacheDocument, read_document, write_document};
use crate::metadata::update_metadata;
use crate::{CacheError, CacheKind};

/// Address to coordinates.
pub type GeocodeMap = BTreeMap<String, Coordinates>;

/// Outcome of merging lookups into the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// New addresses added.
    pub added: usize,
    /// Existing addresses overwritten (forced refresh only).
    pub replaced: usize,
    /// Existing addresses left as they were.
    pub kept: usize,
}

/// Merges `updates` into `existing`. Existing entries are only replaced
/// when `force` is set.
pub fn merge_entries(existing: &mut GeocodeMap, updates: GeocodeMap, force: bool) -> MergeStats {
    let mut stats = MergeStats::default();

    for (address, coords) in updates {
        match existing.get_mut(&address) {
            Some(current) if force => {
                *current = coords;
                stats.replaced += 1;
            }
            Some(_) => stats.kept += 1,
            None => {
                existing.insert(address, coords);
                stats.added += 1;
            }
        }
    }

    stats
}

/// Handle to the geocode cache document.
#[derive(Debug, Clone)]
pub struct GeocodeCache {
    path: PathBuf,
    metadata_path: PathBuf,
}

impl GeocodeCache {
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

    /// Loads the cached map if it is no older than `max_age_days`. Ages
    /// beyond the range of [`TimeDelta`] never expire.
    #[must_use]
    pub fn load(&self, max_age_days: i64) -> Option<GeocodeMap> {
        self.load_at(max_age_days, Utc::now())
    }

    /// [`Self::load`] evaluated at `now`.
    #[must_use]
    pub fn load_at(&self, max_age_days: i64, now: DateTime<Utc>) -> Option<GeocodeMap> {
        let document = read_document::<GeocodeMap>(&self.path)?;

        let max_age = TimeDelta::try_days(max_age_days).unwrap_or(if max_age_days < 0 {
            TimeDelta::MIN
        } else {
            TimeDelta::MAX
        });

        if !document.is_fresh(now, max_age) {
            log::info!("Geocode cache expired (older than {max_age_days} days)");
            return None;
        }

        log::info!(
            "Loaded {} geocoded addresses from cache",
            document.total_entries
        );
        Some(document.payload)
    }

    /// Loads whatever the document holds, ignoring its age.
    #[must_use]
    pub fn load_any(&self) -> GeocodeMap {
        read_document::<GeocodeMap>(&self.path)
            .map(|d| d.payload)
            .unwrap_or_default()
    }

    /// Overwrites the document with `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the document cannot be written.
    pub fn save(&self, entries: &GeocodeMap) -> Result<(), CacheError> {
        let now = Utc::now();
        let document = CacheDocument::new(entries, entries.len(), None, now);
        write_document(&self.path, &document)?;
        update_metadata(
            &self.metadata_path,
            CacheKind::GeocodedAddresses,
            &self.path,
            now,
        )?;

        log::info!("Saved {} geocoded addresses to cache", entries.len());
        Ok(())
    }

    /// Merges `updates` into the stored entries and saves the result. The
    /// document is re-stamped even when `updates` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the document cannot be written.
    pub fn update(&self, updates: GeocodeMap, force: bool) -> Result<MergeStats, CacheError> {
        let mut entries = self.load_any();
        let stats = merge_entries(&mut entries, updates, force);
        self.save(&entries)?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(dir: &Path) -> GeocodeCache {
        GeocodeCache::new(
            dir.join("geocode_cache.json"),
            dir.join("cache_metadata.json"),
        )
    }

    #[test]
    fn merge_never_overwrites_without_force() {
        let mut existing = GeocodeMap::from([("KING ST N".to_string(), Coordinates::new(1.0, 1.0))]);
        let updates = GeocodeMap::from([
            ("KING ST N".to_string(), Coordinates::new(9.0, 9.0)),
            ("ERB ST W".to_string(), Coordinates::new(2.0, 2.0)),
        ]);

        let stats = merge_entries(&mut existing, updates, false);

        assert_eq!(stats, MergeStats { added: 1, replaced: 0, kept: 1 });
        assert_eq!(existing["KING ST N"], Coordinates::new(1.0, 1.0));
        assert_eq!(existing["ERB ST W"], Coordinates::new(2.0, 2.0));
    }

    #[test]
    fn merge_overwrites_when_forced() {
        let mut existing = GeocodeMap::from([("KING ST N".to_string(), Coordinates::new(1.0, 1.0))]);
        let updates = GeocodeMap::from([("KING ST N".to_string(), Coordinates::new(9.0, 9.0))]);

        let stats = merge_entries(&mut existing, updates, true);

        assert_eq!(stats.replaced, 1);
        assert_eq!(existing["KING ST N"], Coordinates::new(9.0, 9.0));
    }

    #[test]
    fn update_persists_merged_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        cache
            .save(&GeocodeMap::from([(
                "KING ST N".to_string(),
                Coordinates::new(43.46, -80.52),
            )]))
            .unwrap();

        cache
            .update(
                GeocodeMap::from([("ERB ST W".to_string(), Coordinates::new(43.47, -80.53))]),
                false,
            )
            .unwrap();

        let loaded = cache.load(30).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn expired_cache_is_a_miss_but_kept_for_merging() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        cache
            .save(&GeocodeMap::from([(
                "KING ST N".to_string(),
                Coordinates::new(43.46, -80.52),
            )]))
            .unwrap();

        let later = Utc::now() + TimeDelta::days(31);
        assert!(cache.load_at(30, later).is_none());
        assert_eq!(cache.load_any().len(), 1);
    }

    #[test]
    fn corrupt_cache_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        std::fs::write(cache.path(), "garbage").unwrap();
        assert!(cache.load(30).is_none());
        assert!(cache.load_any().is_empty());
    }

    #[test]
    fn empty_update_restamps_expired_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        let stale = CacheDocument::new(
            GeocodeMap::from([("KING ST N".to_string(), Coordinates::new(43.46, -80.52))]),
            1,
            None,
            Utc::now() - TimeDelta::days(31),
        );
        write_document(cache.path(), &stale).unwrap();
        assert!(cache.load(30).is_none());

        let stats = cache.update(GeocodeMap::new(), false).unwrap();

        assert_eq!(stats, MergeStats::default());
        assert_eq!(cache.load(30).unwrap().len(), 1);
    }

    #[test]
    fn out_of_range_max_age_never_expires() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        cache
            .save(&GeocodeMap::from([(
                "KING ST N".to_string(),
                Coordinates::new(43.46, -80.52),
            )]))
            .unwrap();

        let later = Utc::now() + TimeDelta::days(3650);
        assert_eq!(cache.load_at(i64::MAX, later).unwrap().len(), 1);
        assert!(cache.load_at(i64::MIN, Utc::now()).is_none());
    }
}
