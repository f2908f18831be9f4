//! Cache-first analysis runs.
//!
//! A run serves the cached analysis when it is fresh, matches the current
//! source fingerprint and was produced by the same strategy. Otherwise the
//! datasets are loaded, scored and the result is written back. A failed
//! cache write is logged and the fresh result is still returned.

use std::path::PathBuf;

use chrono::TimeDelta;
use parking_safety_cache::AnalysisCache;
use parking_safety_cache::analysis::DEFAULT_MAX_AGE_HOURS;
use parking_safety_safety_models::SafetyAnalysisMap;
use parking_safety_source::{DatasetPaths, Datasets, load_datasets};

use crate::{AnalysisError, SafetyEngine};

/// How a run may use the analysis cache.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    /// Whether to read and write the cache at all.
    pub enabled: bool,
    /// Maximum age of a cached analysis.
    pub max_age: TimeDelta,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age: TimeDelta::hours(DEFAULT_MAX_AGE_HOURS),
        }
    }
}

impl CachePolicy {
    /// Cache enabled with a max age in hours. Ages beyond the range of
    /// [`TimeDelta`] saturate, so the cache never expires.
    #[must_use]
    pub fn max_age_hours(hours: i64) -> Self {
        Self {
            enabled: true,
            max_age: TimeDelta::try_hours(hours).unwrap_or(if hours < 0 {
                TimeDelta::MIN
            } else {
                TimeDelta::MAX
            }),
        }
    }

    /// Always recompute and never write.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            max_age: TimeDelta::zero(),
        }
    }
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    /// Analysis per location.
    pub analysis: SafetyAnalysisMap,
    /// Whether `analysis` was served from the cache.
    pub from_cache: bool,
}

/// Serves the analysis from `cache` or computes and stores it.
///
/// # Errors
///
/// Returns [`AnalysisError`] if the datasets have to be loaded and an
/// existing file cannot be read.
pub fn run_analysis(
    engine: &SafetyEngine,
    paths: &DatasetPaths,
    cache: &AnalysisCache,
    policy: CachePolicy,
) -> Result<AnalysisRun, AnalysisError> {
    let tracked = paths.tracked_files();

    if policy.enabled {
        let cached: Option<SafetyAnalysisMap> = cache.load(&tracked, policy.max_age);
        if let Some(analysis) = cached {
            if analysis.values().all(|a| a.strategy == engine.strategy()) {
                return Ok(AnalysisRun {
                    analysis,
                    from_cache: true,
                });
            }
            log::info!(
                "Cached analysis used a different strategy, recomputing with {}",
                engine.strategy()
            );
        }
    }

    let datasets = load_datasets(paths)?;
    let analysis = analyze_and_store(engine, &datasets, &tracked, cache, policy);

    Ok(AnalysisRun {
        analysis,
        from_cache: false,
    })
}

fn analyze_and_store(
    engine: &SafetyEngine,
    datasets: &Datasets,
    tracked: &[PathBuf],
    cache: &AnalysisCache,
    policy: CachePolicy,
) -> SafetyAnalysisMap {
    let analysis = engine.analyze_all(datasets);

    if policy.enabled
        && let Err(e) = cache.save(&analysis, tracked)
    {
        log::warn!("Failed to cache safety analysis: {e}");
    }

    analysis
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use parking_safety_cache::CacheManager;
    use parking_safety_parking_models::LocationKey;
    use parking_safety_safety_models::ScoringStrategy;

    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        paths: DatasetPaths,
        caches: CacheManager,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        let paths = DatasetPaths::in_dir(&data);
        std::fs::write(
            &paths.bylaw_infractions,
            "DATE,STREET,REASON\n3/20/2024,KING ST N,NO PARKING\n3/21/2024,ERB ST W,EXPIRED METER\n",
        )
        .unwrap();
        std::fs::write(
            &paths.parking_on_street,
            "STREET,NUM_SPACES,PARKING_COST,HOURS\nKING ST N,6,$2.00/HR,2HR 8AM-6PM\n",
        )
        .unwrap();

        Fixture {
            caches: CacheManager::new(dir.path().join("cache")),
            paths,
            _dir: dir,
        }
    }

    fn engine(strategy: ScoringStrategy) -> SafetyEngine {
        SafetyEngine::new(strategy).with_today(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())
    }

    #[test]
    fn second_run_is_served_from_cache() {
        let f = fixture();
        let engine = engine(ScoringStrategy::Comprehensive);
        let cache = f.caches.analysis();

        let first = run_analysis(&engine, &f.paths, &cache, CachePolicy::default()).unwrap();
        let second = run_analysis(&engine, &f.paths, &cache, CachePolicy::default()).unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.analysis, second.analysis);
        assert!(
            first
                .analysis
                .contains_key(&LocationKey::new("KING ST N").unwrap())
        );
    }

    #[test]
    fn disabled_cache_never_writes() {
        let f = fixture();
        let cache = f.caches.analysis();
        let run = run_analysis(
            &engine(ScoringStrategy::Comprehensive),
            &f.paths,
            &cache,
            CachePolicy::disabled(),
        )
        .unwrap();

        assert!(!run.from_cache);
        assert!(!cache.path().exists());
    }

    #[test]
    fn strategy_change_recomputes() {
        let f = fixture();
        let cache = f.caches.analysis();
        run_analysis(
            &engine(ScoringStrategy::Comprehensive),
            &f.paths,
            &cache,
            CachePolicy::default(),
        )
        .unwrap();

        let run = run_analysis(
            &engine(ScoringStrategy::InfractionRate),
            &f.paths,
            &cache,
            CachePolicy::default(),
        )
        .unwrap();

        assert!(!run.from_cache);
        assert!(
            run.analysis
                .values()
                .all(|a| a.strategy == ScoringStrategy::InfractionRate)
        );
    }

    #[test]
    fn unwritable_cache_still_returns_analysis() {
        let f = fixture();
        let blocker = f.paths.bylaw_infractions.parent().unwrap().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();
        let cache = AnalysisCache::new(
            blocker.join("safety_analysis_cache.json"),
            blocker.join("cache_metadata.json"),
        );

        let run = run_analysis(
            &engine(ScoringStrategy::Comprehensive),
            &f.paths,
            &cache,
            CachePolicy::default(),
        )
        .unwrap();

        assert!(!run.from_cache);
        assert_eq!(run.analysis.len(), 2);
    }

    #[test]
    fn out_of_range_max_age_saturates() {
        let policy = CachePolicy::max_age_hours(3_000_000_000_000_000);
        assert!(policy.enabled);
        assert_eq!(policy.max_age, TimeDelta::MAX);
        assert_eq!(CachePolicy::max_age_hours(i64::MIN).max_age, TimeDelta::MIN);
        assert_eq!(CachePolicy::max_age_hours(6).max_age, TimeDelta::hours(6));

        let f = fixture();
        let engine = engine(ScoringStrategy::Comprehensive);
        let cache = f.caches.analysis();
        run_analysis(&engine, &f.paths, &cache, policy).unwrap();
        let run = run_analysis(&engine, &f.paths, &cache, policy).unwrap();
        assert!(run.from_cache);
    }
}
