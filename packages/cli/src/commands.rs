//! Subcommand implementations. Each prints a plain-text summary to stdout
//! and leaves details to the log.

use std::collections::BTreeMap;
use std::str::FromStr as _;

use parking_safety_cache::{CacheKind, CacheManager};
use parking_safety_cli_utils::{IndicatifProgress, MultiProgress};
use parking_safety_geocoder::service_registry::google_service;
use parking_safety_geocoder::{GeocodeError, Geocoder as _, GoogleGeocoder, geocode_all};
use parking_safety_safety::{
    AnalysisRun, CachePolicy, SafetyEngine, run_analysis, search_locations,
};
use parking_safety_safety_models::{
    SafetyAnalysis, SafetyAnalysisMap, SafetyLevel, ScoringStrategy,
};
use parking_safety_source::{DatasetPaths, load_datasets};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Options for `analyze`.
pub struct AnalyzeOptions {
    pub strategy: ScoringStrategy,
    pub max_age_hours: Option<i64>,
    pub no_cache: bool,
    pub top: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            strategy: ScoringStrategy::default(),
            max_age_hours: None,
            no_cache: false,
            top: 10,
        }
    }
}

impl AnalyzeOptions {
    fn policy(&self) -> CachePolicy {
        if self.no_cache {
            CachePolicy::disabled()
        } else {
            self.max_age_hours
                .map_or_else(CachePolicy::default, CachePolicy::max_age_hours)
        }
    }
}

fn level_counts(analysis: &SafetyAnalysisMap) -> BTreeMap<SafetyLevel, usize> {
    let mut counts: BTreeMap<SafetyLevel, usize> =
        SafetyLevel::all().iter().map(|l| (*l, 0)).collect();
    for a in analysis.values() {
        *counts.entry(a.safety_level).or_default() += 1;
    }
    counts
}

fn riskiest(analysis: &SafetyAnalysisMap, n: usize) -> Vec<&SafetyAnalysis> {
    let mut all: Vec<&SafetyAnalysis> = analysis.values().collect();
    all.sort_by(|a, b| a.safety_score.total_cmp(&b.safety_score));
    all.truncate(n);
    all
}

fn print_row(a: &SafetyAnalysis) {
    println!(
        "{:>6.2}  {:<12} {:>6}  {}",
        a.safety_score,
        a.safety_level.label(),
        a.infraction_analysis.total_count,
        a.location.as_str()
    );
}

fn print_header() {
    println!("{:>6}  {:<12} {:>6}  LOCATION", "SCORE", "LEVEL", "TICKETS");
    println!("{}", "-".repeat(60));
}

fn analyze_with_spinner(
    multi: &MultiProgress,
    options: &AnalyzeOptions,
) -> Result<AnalysisRun, Box<dyn std::error::Error>> {
    let spinner = IndicatifProgress::spinner(multi, "Analyzing parking safety");
    let engine = SafetyEngine::new(options.strategy);
    let caches = CacheManager::from_env();

    let run = run_analysis(
        &engine,
        &DatasetPaths::from_env(),
        &caches.analysis(),
        options.policy(),
    )?;

    spinner.finish(format!(
        "Analyzed {} locations{}",
        run.analysis.len(),
        if run.from_cache { " (cached)" } else { "" }
    ));

    Ok(run)
}

/// Scores every location and prints the level distribution and the
/// riskiest locations.
///
/// # Errors
///
/// Returns an error if the datasets cannot be read.
pub fn analyze(multi: &MultiProgress, options: &AnalyzeOptions) -> CliResult {
    let run = analyze_with_spinner(multi, options)?;

    println!();
    println!("Strategy: {}", options.strategy);
    println!("Locations: {}", run.analysis.len());
    println!();
    for (level, count) in level_counts(&run.analysis) {
        println!("  {:<12} {count}", level.label());
    }

    let worst = riskiest(&run.analysis, options.top);
    if !worst.is_empty() {
        println!();
        println!("Riskiest locations:");
        print_header();
        for a in worst {
            print_row(a);
        }
    }

    Ok(())
}

/// Prints analysed locations whose key contains `term`, safest first.
///
/// # Errors
///
/// Returns an error if the datasets cannot be read.
pub fn search(multi: &MultiProgress, term: &str) -> CliResult {
    let run = analyze_with_spinner(multi, &AnalyzeOptions::default())?;
    let matches = search_locations(&run.analysis, term);

    if matches.is_empty() {
        println!("No locations match \"{term}\"");
        return Ok(());
    }

    print_header();
    for a in &matches {
        print_row(a);
    }
    println!();
    println!("{} matching locations", matches.len());

    Ok(())
}

/// Estimates safety for a location from similar streets.
///
/// # Errors
///
/// Returns an error if the datasets cannot be read.
pub fn predict(location: &str) -> CliResult {
    let datasets = load_datasets(&DatasetPaths::from_env())?;
    let prediction = SafetyEngine::default().predict(location, &datasets);

    println!("Location:   {}", prediction.location);
    println!(
        "Safety:     {} ({:.2})",
        prediction.safety_level.label(),
        prediction.safety_score
    );
    println!(
        "Confidence: {} ({} similar locations, {:.1} tickets on average)",
        prediction.confidence, prediction.similar_locations_analyzed, prediction.average_infractions
    );
    println!();
    println!("{}", prediction.recommendation);

    Ok(())
}

/// Geocodes every address the geocode cache does not hold yet.
///
/// # Errors
///
/// Returns an error if no API key is configured, the datasets cannot be
/// read, or the geocode cache cannot be written.
pub async fn geocode(multi: &MultiProgress, force: bool) -> CliResult {
    let geocoder = GoogleGeocoder::from_env();
    if !geocoder.is_available() {
        return Err(GeocodeError::Unavailable.into());
    }

    let datasets = load_datasets(&DatasetPaths::from_env())?;
    let caches = CacheManager::from_env();
    let service = google_service();

    let progress = IndicatifProgress::batch_bar(multi, "Geocoding addresses");
    let report = geocode_all(
        &geocoder,
        &datasets,
        &caches.geocode(),
        force,
        service.rate_limit,
        progress.as_ref(),
    )
    .await?;

    println!();
    println!("Addresses:      {}", report.total_addresses);
    println!("Already cached: {}", report.already_cached);
    println!("Attempted:      {}", report.attempted);
    println!("Succeeded:      {}", report.succeeded);
    println!("Failed:         {}", report.failed.len());
    if !report.failed.is_empty() {
        log::warn!(
            "{} addresses could not be geocoded; rerun later or check the API quota",
            report.failed.len()
        );
    }
    for address in report.failed.iter().take(20) {
        println!("  {address}");
    }

    Ok(())
}

/// Prints the state of each cache document.
pub fn cache_status() {
    let status = CacheManager::from_env().status();

    println!("Cache directory: {}", status.cache_dir.display());
    println!();
    println!(
        "{:<20} {:>8} {:>10} {:>10}  UPDATED",
        "CACHE", "EXISTS", "ENTRIES", "BYTES"
    );
    println!("{}", "-".repeat(75));
    for entry in &status.entries {
        println!(
            "{:<20} {:>8} {:>10} {:>10}  {}",
            entry.kind.to_string(),
            if entry.exists { "yes" } else { "no" },
            entry
                .total_entries
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
            entry
                .file_size
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
            entry.error.clone().unwrap_or_else(|| {
                entry
                    .last_updated
                    .map_or_else(|| "-".to_string(), |t| t.to_rfc3339())
            }),
        );
    }
}

/// Parses a cache kind argument; `"all"` selects every kind.
///
/// # Errors
///
/// Returns an error naming the valid kinds when `name` is unknown.
pub fn parse_cache_kind(name: &str) -> Result<Option<CacheKind>, String> {
    if name.eq_ignore_ascii_case("all") {
        return Ok(None);
    }

    CacheKind::from_str(name).map(Some).map_err(|_| {
        let valid: Vec<String> = CacheKind::all().iter().map(ToString::to_string).collect();
        format!("Unknown cache type '{name}' (expected all, {})", valid.join(", "))
    })
}

/// Removes one cache kind, or all of them.
///
/// # Errors
///
/// Returns an error if a cache file exists but cannot be removed.
pub fn cache_clear(kind: Option<CacheKind>) -> CliResult {
    let cleared = CacheManager::from_env().clear(kind)?;

    if cleared.is_empty() {
        println!("Nothing to clear");
    } else {
        let names: Vec<String> = cleared.iter().map(ToString::to_string).collect();
        println!("Cleared caches: {}", names.join(", "));
    }

    Ok(())
}

/// Copies the geocode cache to a timestamped backup file.
///
/// # Errors
///
/// Returns an error if the backup cannot be written.
pub fn cache_backup() -> CliResult {
    match CacheManager::from_env().backup_geocode()? {
        Some(path) => println!("Backed up geocode cache to {}", path.display()),
        None => println!("No geocode cache to back up"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use parking_safety_parking_models::InfractionRecord;
    use parking_safety_source::Datasets;

    use super::*;

    #[test]
    fn cache_kind_argument() {
        assert_eq!(parse_cache_kind("all"), Ok(None));
        assert_eq!(parse_cache_kind("ALL"), Ok(None));
        assert_eq!(
            parse_cache_kind("geocoded_addresses"),
            Ok(Some(CacheKind::GeocodedAddresses))
        );

        let err = parse_cache_kind("tiles").unwrap_err();
        assert!(err.contains("safety_analysis"));
    }

    #[test]
    fn policy_follows_flags() {
        let options = AnalyzeOptions {
            no_cache: true,
            max_age_hours: Some(2),
            ..AnalyzeOptions::default()
        };
        assert!(!options.policy().enabled);

        let options = AnalyzeOptions {
            max_age_hours: Some(2),
            ..AnalyzeOptions::default()
        };
        assert!(options.policy().enabled);
        assert_eq!(options.policy().max_age, chrono::TimeDelta::hours(2));

        assert_eq!(AnalyzeOptions::default().strategy, ScoringStrategy::Comprehensive);
    }

    #[test]
    fn riskiest_sorts_lowest_score_first() {
        let infraction = |street: &str| InfractionRecord {
            street: street.to_string(),
            reason: "EXPIRED METER".to_string(),
            date: "3/20/2024".to_string(),
            ..InfractionRecord::default()
        };
        let datasets = Datasets {
            infractions: std::iter::repeat_with(|| infraction("KING ST N"))
                .take(6)
                .chain(std::iter::once(infraction("ERB ST W")))
                .collect(),
            ..Datasets::default()
        };
        let analysis = SafetyEngine::default()
            .with_today(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())
            .analyze_all(&datasets);

        let worst = riskiest(&analysis, 1);
        assert_eq!(worst.len(), 1);
        assert_eq!(worst[0].location.as_str(), "KING ST N");

        let counts = level_counts(&analysis);
        assert_eq!(counts.len(), SafetyLevel::all().len());
        assert_eq!(counts.values().sum::<usize>(), 2);
    }
}
