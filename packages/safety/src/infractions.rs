//! Infraction statistics: counts, recency, severity, fines and peak hours.

use chrono::{Days, NaiveDate};
use parking_safety_parking_models::InfractionRecord;
use parking_safety_safety_models::{InfractionAnalysis, ViolationCount};
use parking_safety_source::parsing::parse_issue_timestamp;

/// Length of the recency window in days.
pub const RECENCY_WINDOW_DAYS: u64 = 30;

/// Severity weights by reason substring, checked in order.
const SEVERITY_WEIGHTS: &[(&str, f64)] = &[
    ("NO PARKING", 1.5),
    ("PERMIT PARKING ONLY", 1.3),
    ("FIRE ROUTE", 2.0),
    ("HANDICAP", 1.8),
    ("LOADING ZONE", 1.2),
    ("EXPIRED METER", 0.8),
    ("OVERTIME PARKING", 0.9),
    ("RESERVED", 1.4),
    ("TIME LIMIT EXCEEDED", 0.7),
    ("METER VIOLATION", 0.8),
];

const DEFAULT_SEVERITY: f64 = 1.0;

/// Number of peak hours reported.
const PEAK_HOUR_COUNT: usize = 3;

/// Severity weight for an upper-cased reason; first table match wins.
#[must_use]
pub fn severity_weight(reason: &str) -> f64 {
    SEVERITY_WEIGHTS
        .iter()
        .find(|(needle, _)| reason.contains(needle))
        .map_or(DEFAULT_SEVERITY, |(_, weight)| *weight)
}

/// Top hours by frequency. Ties keep the order in which each hour was
/// first seen.
#[must_use]
pub fn peak_hours(hours: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut counts: Vec<(u32, usize)> = Vec::new();
    for hour in hours {
        match counts.iter_mut().find(|(h, _)| *h == hour) {
            Some((_, count)) => *count += 1,
            None => counts.push((hour, 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(PEAK_HOUR_COUNT)
        .map(|(hour, _)| hour)
        .collect()
}

/// Formats an hour as `"HH:00"`.
#[must_use]
pub fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00")
}

/// Analyses the infractions of one location relative to `today`.
///
/// Every record counts toward `total_count`. Records with an unparseable
/// issue date are skipped for recency and the hour histogram; date-only
/// records count for recency but not for hours.
#[must_use]
pub fn analyze_infractions(records: &[&InfractionRecord], today: NaiveDate) -> InfractionAnalysis {
    if records.is_empty() {
        return InfractionAnalysis {
            temporal_pattern: "No data".to_string(),
            ..InfractionAnalysis::default()
        };
    }

    let cutoff = today
        .checked_sub_days(Days::new(RECENCY_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MIN);

    let mut types: Vec<ViolationCount> = Vec::new();
    let mut total_severity = 0.0;
    let mut total_fines = 0.0;
    let mut fine_count = 0_u32;
    let mut recent_count = 0;
    let mut unparseable_dates = 0;
    let mut hours = Vec::new();

    for record in records {
        let reason = record.reason.trim().to_uppercase();
        let reason = if reason.is_empty() {
            "UNKNOWN".to_string()
        } else {
            reason
        };

        total_severity += severity_weight(&reason);

        match types.iter_mut().find(|t| t.reason == reason) {
            Some(entry) => entry.count += 1,
            None => types.push(ViolationCount { reason, count: 1 }),
        }

        if let Some(fine) = record.fine {
            total_fines += fine;
            fine_count += 1;
        }

        match parse_issue_timestamp(&record.date) {
            Ok(issued) => {
                if issued.date >= cutoff {
                    recent_count += 1;
                }
                if let Some(hour) = issued.hour {
                    hours.push(hour);
                }
            }
            Err(e) => {
                unparseable_dates += 1;
                log::trace!("Skipping infraction date {:?}: {e}", record.date);
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let severity_score = total_severity / records.len() as f64;
    let average_fine = if fine_count == 0 {
        0.0
    } else {
        total_fines / f64::from(fine_count)
    };

    let most_common_violation = types
        .iter()
        .fold(None::<&ViolationCount>, |best, t| match best {
            Some(b) if b.count >= t.count => Some(b),
            _ => Some(t),
        })
        .map(|t| t.reason.clone());

    let peak_hours = peak_hours(hours);
    let peak_times = peak_hours.iter().copied().map(hour_label).collect();

    InfractionAnalysis {
        total_count: records.len(),
        recent_count,
        severity_score,
        infraction_types: types,
        most_common_violation,
        average_fine,
        peak_hours,
        peak_times,
        temporal_pattern: format!("Based on {} infractions", records.len()),
        unparseable_dates,
    }
}
