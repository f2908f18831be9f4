//! Batch geocoding of every distinct record address.

use parking_safety_cache::{GeocodeCache, GeocodeMap};
use parking_safety_source::progress::ProgressCallback;
use parking_safety_source::{Datasets, unique_addresses};
use serde::Serialize;

use crate::service_registry::RateLimit;
use crate::{GeocodeError, Geocoder};

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeocodingReport {
    /// Distinct addresses across the datasets.
    pub total_addresses: usize,
    /// Addresses skipped because the cache already had them.
    pub already_cached: usize,
    /// Addresses sent to the provider.
    pub attempted: usize,
    /// Addresses the provider resolved.
    pub succeeded: usize,
    /// Addresses that could not be resolved.
    pub failed: Vec<String>,
}

/// Geocodes every distinct address in `datasets` that `cache` does not
/// hold yet, regardless of the cache's age (or every address when `force`
/// is set), and merges the results into the cache. The cache document is
/// rewritten on every successful run, which also refreshes its timestamp.
///
/// Failures are per address: they are logged, listed in the report and
/// the batch continues.
///
/// # Errors
///
/// Returns [`GeocodeError::Unavailable`] if the geocoder has no API key,
/// or [`GeocodeError::Cache`] if the results cannot be saved.
pub async fn geocode_all(
    geocoder: &dyn Geocoder,
    datasets: &Datasets,
    cache: &GeocodeCache,
    force: bool,
    rate_limit: RateLimit,
    progress: &dyn ProgressCallback,
) -> Result<GeocodingReport, GeocodeError> {
    if !geocoder.is_available() {
        log::warn!("{} geocoder not available for batch geocoding", geocoder.name());
        return Err(GeocodeError::Unavailable);
    }

    let addresses = unique_addresses(datasets);
    let cached = cache.load_any();

    let pending: Vec<&String> = addresses
        .iter()
        .filter(|a| force || !cached.contains_key(a.as_str()))
        .collect();

    let mut report = GeocodingReport {
        total_addresses: addresses.len(),
        already_cached: addresses.len() - pending.len(),
        ..GeocodingReport::default()
    };

    log::info!(
        "Geocoding {} of {} addresses ({} already cached)",
        pending.len(),
        report.total_addresses,
        report.already_cached
    );
    progress.set_total(pending.len() as u64);
    progress.set_message("Geocoding addresses".to_string());

    let mut resolved = GeocodeMap::new();

    for (i, address) in pending.iter().enumerate() {
        report.attempted += 1;

        match geocoder.geocode(address).await {
            Ok(Some(coords)) => {
                resolved.insert((*address).clone(), coords);
                report.succeeded += 1;
            }
            Ok(None) => {
                log::debug!("No result for {address}");
                report.failed.push((*address).clone());
            }
            Err(e) => {
                log::warn!("Error geocoding {address}: {e}");
                report.failed.push((*address).clone());
            }
        }

        progress.inc(1);

        if rate_limit.should_pause_after(i + 1) {
            log::debug!("Geocoded {}/{} addresses", i + 1, pending.len());
            tokio::time::sleep(rate_limit.pause()).await;
        }
    }

    // Saved even when nothing new resolved so the document is re-stamped
    // and age-bounded readers see it as current.
    let stats = cache.update(resolved, force)?;
    log::info!(
        "Geocode cache updated: {} added, {} replaced, {} kept",
        stats.added,
        stats.replaced,
        stats.kept
    );

    progress.finish(format!(
        "Geocoded {}/{} addresses",
        report.succeeded, report.attempted
    ));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeDelta, Utc};
    use parking_safety_cache::document::{CacheDocument, write_document};
    use parking_safety_parking_models::{Coordinates, InfractionRecord, ParkingLotRecord};
    use parking_safety_source::progress::NullProgress;

    use super::*;

    struct FakeGeocoder {
        available: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeGeocoder {
        fn new(available: bool) -> Self {
            Self {
                available,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Geocoder for FakeGeocoder {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
            self.calls.lock().unwrap().push(address.to_string());
            match address {
                "NOWHERE" => Ok(None),
                "BROKEN" => Err(GeocodeError::RateLimited),
                _ => Ok(Some(Coordinates::new(43.0, -80.0))),
            }
        }
    }

    fn datasets() -> Datasets {
        let ticket = |street: &str| InfractionRecord {
            street: street.to_string(),
            ..InfractionRecord::default()
        };
        Datasets {
            infractions: vec![
                ticket("KING ST N"),
                ticket("KING ST N"),
                ticket("NOWHERE"),
                ticket("BROKEN"),
            ],
            parking_lots: vec![ParkingLotRecord {
                address: "100 REGINA ST S".to_string(),
                ..ParkingLotRecord::default()
            }],
            ..Datasets::default()
        }
    }

    fn limit() -> RateLimit {
        RateLimit {
            pause_every: 2,
            pause_ms: 100,
        }
    }

    fn cache(dir: &tempfile::TempDir) -> GeocodeCache {
        GeocodeCache::new(
            dir.path().join("geocode_cache.json"),
            dir.path().join("cache_metadata.json"),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        let geocoder = FakeGeocoder::new(true);

        let report = geocode_all(&geocoder, &datasets(), &cache, false, limit(), &NullProgress)
            .await
            .unwrap();

        assert_eq!(report.total_addresses, 4);
        assert_eq!(report.attempted, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, vec!["NOWHERE", "BROKEN"]);

        let stored = cache.load_any();
        assert_eq!(stored.len(), 2);
        assert!(stored.contains_key("100 REGINA ST S"));
    }

    #[tokio::test(start_paused = true)]
    async fn skips_cached_addresses_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        cache
            .save(&GeocodeMap::from([(
                "KING ST N".to_string(),
                Coordinates::new(1.0, 1.0),
            )]))
            .unwrap();

        let geocoder = FakeGeocoder::new(true);
        let report = geocode_all(&geocoder, &datasets(), &cache, false, limit(), &NullProgress)
            .await
            .unwrap();
        assert_eq!(report.already_cached, 1);
        assert!(!geocoder.calls.lock().unwrap().contains(&"KING ST N".to_string()));
        assert_eq!(cache.load_any()["KING ST N"], Coordinates::new(1.0, 1.0));

        let forced = FakeGeocoder::new(true);
        let report = geocode_all(&forced, &datasets(), &cache, true, limit(), &NullProgress)
            .await
            .unwrap();
        assert_eq!(report.already_cached, 0);
        assert_eq!(cache.load_any()["KING ST N"], Coordinates::new(43.0, -80.0));
    }

    #[tokio::test]
    async fn unavailable_geocoder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let geocoder = FakeGeocoder::new(false);
        let result =
            geocode_all(&geocoder, &datasets(), &cache(&dir), false, limit(), &NullProgress).await;

        assert!(matches!(result, Err(GeocodeError::Unavailable)));
        assert!(geocoder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fully_cached_batch_refreshes_expired_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        let stale = CacheDocument::new(
            GeocodeMap::from([("KING ST N".to_string(), Coordinates::new(1.0, 1.0))]),
            1,
            None,
            Utc::now() - TimeDelta::days(31),
        );
        write_document(cache.path(), &stale).unwrap();
        assert!(cache.load(30).is_none());

        let datasets = Datasets {
            infractions: vec![InfractionRecord {
                street: "KING ST N".to_string(),
                ..InfractionRecord::default()
            }],
            ..Datasets::default()
        };
        let geocoder = FakeGeocoder::new(true);
        let report = geocode_all(&geocoder, &datasets, &cache, false, limit(), &NullProgress)
            .await
            .unwrap();

        assert_eq!(report.attempted, 0);
        assert_eq!(report.already_cached, 1);
        let loaded = cache.load(30).unwrap();
        assert_eq!(loaded["KING ST N"], Coordinates::new(1.0, 1.0));
    }
}
