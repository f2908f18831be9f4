//! Coordinate attachment and map markers.
//!
//! Records are placed at their cached coordinates when the geocode cache
//! knows their address and at the default center otherwise. Safety
//! markers are only produced for locations the cache knows.

use std::collections::BTreeMap;

use parking_safety_cache::GeocodeMap;
use parking_safety_parking_models::{Coordinates, Dataset, ParkingRecord};
use parking_safety_safety_models::{
    CoordinateCoverage, LocatedRecord, Marker, SafetyAnalysisMap,
};
use parking_safety_source::Datasets;

const ICON_BASE: &str = "https://maps.google.com/mapfiles/ms/icons";

fn dot_icon(color: &str) -> String {
    format!("{ICON_BASE}/{color}-dot.png")
}

/// Icon for a safety score: green, yellow, orange or red dot.
#[must_use]
pub fn safety_icon(score: f64) -> String {
    let color = if score >= 0.8 {
        "green"
    } else if score >= 0.6 {
        "yellow"
    } else if score >= 0.4 {
        "orange"
    } else {
        "red"
    };
    dot_icon(color)
}

/// Marker color per dataset.
#[must_use]
pub const fn dataset_color(dataset: Dataset) -> &'static str {
    match dataset {
        Dataset::BylawInfractions => "#FF0000",
        Dataset::ParkingOnStreet => "#0000FF",
        Dataset::ParkingLots => "#00FF00",
    }
}

const fn dataset_icon_color(dataset: Dataset) -> &'static str {
    match dataset {
        Dataset::BylawInfractions => "red",
        Dataset::ParkingOnStreet => "blue",
        Dataset::ParkingLots => "green",
    }
}

fn describe(record: &ParkingRecord) -> String {
    fn or_unknown(s: &str) -> &str {
        let s = s.trim();
        if s.is_empty() { "Unknown" } else { s }
    }

    match record {
        ParkingRecord::BylawInfractions(r) => format!("Infraction: {}", or_unknown(&r.reason)),
        ParkingRecord::ParkingOnStreet(r) => format!(
            "Street Parking: {} spaces, {}",
            r.num_spaces,
            or_unknown(&r.parking_cost)
        ),
        ParkingRecord::ParkingLots(r) => format!("Parking Lot: {}", or_unknown(&r.lot_type)),
    }
}

/// Places every record at its cached coordinates, or at `default` when
/// the cache has no entry for its address.
#[must_use]
pub fn attach_coordinates(
    datasets: &Datasets,
    geocodes: &GeocodeMap,
    default: Coordinates,
) -> (Vec<LocatedRecord>, CoordinateCoverage) {
    let mut coverage = CoordinateCoverage::default();

    let located: Vec<LocatedRecord> = datasets
        .all_records()
        .map(|record| {
            let cached = record
                .geocode_address()
                .and_then(|address| geocodes.get(address))
                .copied();

            coverage.total_records += 1;
            if cached.is_some() {
                coverage.geocoded += 1;
            } else {
                coverage.defaulted += 1;
            }

            LocatedRecord {
                position: cached.unwrap_or(default),
                geocoded: cached.is_some(),
                record,
            }
        })
        .collect();

    log::debug!(
        "Attached coordinates to {} records ({} geocoded, {} defaulted)",
        coverage.total_records,
        coverage.geocoded,
        coverage.defaulted
    );

    (located, coverage)
}

/// One marker per located record, styled by dataset.
#[must_use]
pub fn record_markers(located: &[LocatedRecord]) -> Vec<Marker> {
    located
        .iter()
        .map(|l| {
            let dataset = l.record.dataset();
            Marker {
                dataset: Some(dataset),
                position: l.position,
                title: l.record.title(),
                icon: dot_icon(dataset_icon_color(dataset)),
                color: dataset_color(dataset).to_string(),
                description: describe(&l.record),
                safety_score: None,
                safety_level: None,
            }
        })
        .collect()
}

/// One marker per analysed location that has cached coordinates.
///
/// Cache keys are matched ignoring case and surrounding whitespace.
#[must_use]
pub fn safety_markers(analysis: &SafetyAnalysisMap, geocodes: &GeocodeMap) -> Vec<Marker> {
    let by_key: BTreeMap<String, Coordinates> = geocodes
        .iter()
        .map(|(address, coords)| (address.trim().to_uppercase(), *coords))
        .collect();

    let markers: Vec<Marker> = analysis
        .iter()
        .filter_map(|(key, a)| {
            let position = *by_key.get(key.as_str())?;
            Some(Marker {
                dataset: None,
                position,
                title: format!(
                    "{key} - Safety: {} ({:.2})",
                    a.safety_level, a.safety_score
                ),
                icon: safety_icon(a.safety_score),
                color: a.color.clone(),
                description: a.recommendations.join(" "),
                safety_score: Some(a.safety_score),
                safety_level: Some(a.safety_level),
            })
        })
        .collect();

    log::info!(
        "Created {} safety markers for {} analysed locations",
        markers.len(),
        analysis.len()
    );
    markers
}
