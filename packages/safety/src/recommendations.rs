//! Human-readable advice and summaries derived from an analysis.

use parking_safety_safety_models::{
    InfractionAnalysis, ParkingLotAnalysis, SafetyLevel, StreetParkingAnalysis,
};

const TIME_LIMIT_WARNINGS: &[(&str, &str)] = &[
    ("2HR", "2-hour time limit - set a reminder"),
    ("1HR", "1-hour time limit - short-term parking only"),
    ("30MIN", "30-minute limit - very short-term only"),
];

/// Safety tier line that opens every recommendation list.
#[must_use]
pub fn tier_line(score: f64) -> &'static str {
    if score >= 0.8 {
        "VERY SAFE - Excellent parking choice"
    } else if score >= 0.6 {
        "SAFE - Good parking option with minor considerations"
    } else if score >= 0.4 {
        "MODERATE - Use caution, check time restrictions"
    } else {
        "HIGH RISK - Consider alternative parking"
    }
}

/// Ordered parking advice for one location. The tier line is always first.
#[must_use]
pub fn recommendations(
    score: f64,
    infractions: &InfractionAnalysis,
    street: &StreetParkingAnalysis,
    lots: &ParkingLotAnalysis,
) -> Vec<String> {
    let mut out = vec![tier_line(score).to_string()];

    if infractions.total_count > 50 {
        out.push("High enforcement zone - strictly follow parking rules".to_string());
    } else if infractions.total_count > 20 {
        out.push("Moderate enforcement - be aware of restrictions".to_string());
    }

    if street.has_street_parking {
        let restrictions = street.restriction_text();
        let upper = restrictions.to_uppercase();

        if upper.contains("FREE") {
            out.push(format!("Free parking available during: {restrictions}"));
        }

        if !street.paid_parking_details.is_empty() {
            out.push(format!(
                "Paid parking required: {}",
                street.paid_parking_details.join("; ")
            ));
        }

        if let Some((_, warning)) = TIME_LIMIT_WARNINGS
            .iter()
            .find(|(marker, _)| upper.contains(marker))
        {
            out.push((*warning).to_string());
        }
    }

    if lots.available_lots > 0 {
        out.push(format!(
            "{} parking lot(s) available as alternatives",
            lots.available_lots
        ));
    }

    if infractions.recent_count > 10 {
        out.push("Avoid peak hours - high enforcement activity".to_string());
    }

    if let Some(violation) = &infractions.most_common_violation {
        out.push(format!("Common violation: {violation}"));
    }

    out.push("Winter: Check for snow removal restrictions".to_string());
    out.push("Summer: Popular area - arrive early for best spots".to_string());

    out
}

/// Plain-language summary of the score and the data behind it.
#[must_use]
pub fn reasoning(
    score: f64,
    infractions: &InfractionAnalysis,
    street: &StreetParkingAnalysis,
    lots: &ParkingLotAnalysis,
) -> Vec<String> {
    let mut out = vec![format!("Safety score: {:.1}%", score * 100.0)];

    if infractions.total_count == 0 {
        out.push("No recorded infractions at this location".to_string());
    } else {
        out.push(format!(
            "{} total infractions ({} recent)",
            infractions.total_count, infractions.recent_count
        ));
        if infractions.severity_score > 1.2 {
            out.push("High severity violations recorded".to_string());
        }
    }

    if street.total_spaces > 0 {
        out.push(format!(
            "{} street parking spaces available",
            street.total_spaces
        ));
        if street.free_hours_available() {
            out.push("Free parking periods available".to_string());
        }
    } else {
        out.push("No official street parking".to_string());
    }

    if lots.available_lots > 0 {
        out.push(format!("{} nearby parking lot(s)", lots.available_lots));
    }

    out
}

/// Free periods first, then the peak hours to avoid.
#[must_use]
pub fn best_parking_times(
    street: &StreetParkingAnalysis,
    infractions: &InfractionAnalysis,
) -> Vec<String> {
    let times: Vec<String> = street
        .free_parking_details
        .iter()
        .map(|period| format!("Free period: {period}"))
        .chain(infractions.peak_times.iter().map(|t| format!("Avoid {t}")))
        .collect();

    if times.is_empty() {
        vec!["Check local parking signs for regulations".to_string()]
    } else {
        times
    }
}

/// One-line advice used by similar-location predictions.
#[must_use]
pub fn level_advice(level: SafetyLevel, total: usize, recent: usize) -> String {
    match level {
        SafetyLevel::VerySafe => format!(
            "Very safe to park here. Only {total} total infractions, {recent} recent."
        ),
        SafetyLevel::Safe => format!(
            "Generally safe to park here. {total} total infractions, {recent} recent."
        ),
        SafetyLevel::Moderate => format!(
            "Moderate risk. {total} total infractions, {recent} recent. Consider alternatives."
        ),
        SafetyLevel::Risky => format!(
            "Risky parking area. {total} total infractions, {recent} recent. High chance of ticket."
        ),
        SafetyLevel::Dangerous => format!(
            "Dangerous parking area! {total} total infractions, {recent} recent. Avoid if possible."
        ),
    }
}
