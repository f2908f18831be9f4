//! Street parking rule analysis.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use parking_safety_parking_models::StreetParkingRecord;
use parking_safety_safety_models::StreetParkingAnalysis;
use regex::Regex;

/// A dollar amount (`$2.00`) or a per-hour amount (`2.00/HR`).
static HOURLY_RATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$\s*(\d+(?:\.\d+)?)|(\d+(?:\.\d+)?)\s*/\s*HR").expect("valid regex")
});

const TIME_UNITS: &[&str] = &["HOUR", "HR", "MIN"];

/// First hourly rate found in any of `details`.
#[must_use]
pub fn parse_hourly_rate<'a>(details: impl IntoIterator<Item = &'a str>) -> Option<f64> {
    details.into_iter().find_map(|text| {
        HOURLY_RATE_RE.captures_iter(text).find_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| m.as_str().parse::<f64>().ok())
        })
    })
}

fn names_time_unit(text: &str) -> bool {
    let upper = text.to_uppercase();
    TIME_UNITS.iter().any(|unit| upper.contains(unit))
}

fn join_or_unknown(parts: &[String]) -> String {
    if parts.is_empty() {
        "Unknown".to_string()
    } else {
        parts.join("; ")
    }
}

/// Cost texts that name an hourly limit, in record order.
#[must_use]
pub fn time_restrictions(records: &[&StreetParkingRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.parking_cost.trim())
        .filter(|cost| cost.to_uppercase().contains("HOUR"))
        .map(str::to_string)
        .collect()
}

/// Summarizes the street parking segments of one location.
#[must_use]
pub fn analyze_street_parking(records: &[&StreetParkingRecord]) -> StreetParkingAnalysis {
    if records.is_empty() {
        return StreetParkingAnalysis {
            hours: "Unknown".to_string(),
            parking_cost: "Unknown".to_string(),
            ..StreetParkingAnalysis::default()
        };
    }

    let mut free = Vec::new();
    let mut paid = Vec::new();
    let mut costs = Vec::new();
    let mut hours = Vec::new();
    let mut restrictions: Vec<String> = Vec::new();
    let mut payment_methods = BTreeSet::new();
    let mut ownership = BTreeSet::new();

    let mut push_restriction = |text: &str| {
        if !restrictions.iter().any(|r| r == text) {
            restrictions.push(text.to_string());
        }
    };

    for record in records {
        let cost = record.parking_cost.trim();
        if !cost.is_empty() {
            costs.push(cost.to_string());
            if cost.to_uppercase().contains("FREE") {
                free.push(cost.to_string());
            } else {
                paid.push(cost.to_string());
            }
        }

        let hour_text = record.hours.trim();
        if !hour_text.is_empty() {
            hours.push(hour_text.to_string());
            push_restriction(hour_text);
        }
        if !cost.is_empty() && names_time_unit(cost) {
            push_restriction(cost);
        }

        let payment = record.payment_method.trim();
        if !payment.is_empty() {
            payment_methods.insert(payment.to_string());
        }

        let owner = record.ownership.trim();
        if !owner.is_empty() {
            ownership.insert(owner.to_string());
        }
    }

    let hourly_rate = parse_hourly_rate(paid.iter().map(String::as_str));
    let has_metered_parking = payment_methods
        .iter()
        .any(|m| m.to_uppercase().contains("METER"));

    StreetParkingAnalysis {
        has_street_parking: true,
        total_spaces: records.iter().map(|r| r.num_spaces).sum(),
        free_parking_details: free,
        paid_parking_details: paid,
        hourly_rate,
        payment_methods: payment_methods.into_iter().collect(),
        has_metered_parking,
        ownership: ownership.into_iter().collect(),
        hours: join_or_unknown(&hours),
        parking_cost: join_or_unknown(&costs),
        restrictions,
    }
}
