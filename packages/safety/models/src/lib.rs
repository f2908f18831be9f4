#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Safety analysis result types.
//!
//! These are the derived, serializable outputs of the scoring engine: the
//! per-factor breakdowns for infractions, street parking and lots, the
//! final [`SafetyAnalysis`] per location, and the [`SafetyPrediction`]
//! for locations with no direct data.

pub mod markers;
pub mod thresholds;

use std::collections::BTreeMap;

use parking_safety_parking_models::LocationKey;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use markers::{CoordinateCoverage, LocatedRecord, Marker};
pub use thresholds::{SafetyLevel, Threshold, ThresholdTable, clamp_score};

/// Which scoring formula produced an analysis.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoringStrategy {
    /// Multi-factor score over infractions, street rules and lots.
    #[default]
    Comprehensive,
    /// Normalized infraction totals, recency, severity and rate.
    InfractionRate,
}

/// Count of one violation type at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCount {
    /// Upper-cased violation reason.
    pub reason: String,
    /// Number of infractions with this reason.
    pub count: usize,
}

/// Infraction statistics for one location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfractionAnalysis {
    /// Every infraction record, parseable or not.
    pub total_count: usize,
    /// Infractions issued within the recency window.
    pub recent_count: usize,
    /// Mean severity weight across all infractions.
    pub severity_score: f64,
    /// Counts per violation type in first-seen order.
    pub infraction_types: Vec<ViolationCount>,
    /// Highest-count violation type, ties to the first seen.
    pub most_common_violation: Option<String>,
    /// Mean of the parseable fines, `0` when none.
    pub average_fine: f64,
    /// Up to three busiest hours of day.
    pub peak_hours: Vec<u32>,
    /// `peak_hours` formatted as `"HH:00"`.
    pub peak_times: Vec<String>,
    /// Short description of the data behind the analysis.
    pub temporal_pattern: String,
    /// Records whose issue date could not be parsed.
    pub unparseable_dates: usize,
}

/// Street parking rules for one location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreetParkingAnalysis {
    /// Whether any segment matched the location.
    pub has_street_parking: bool,
    /// Sum of marked spaces.
    pub total_spaces: u32,
    /// Cost texts mentioning free parking.
    pub free_parking_details: Vec<String>,
    /// All other non-empty cost texts.
    pub paid_parking_details: Vec<String>,
    /// First hourly rate found in the paid details.
    pub hourly_rate: Option<f64>,
    /// Distinct payment methods, sorted.
    pub payment_methods: Vec<String>,
    /// Whether any payment method is a meter.
    pub has_metered_parking: bool,
    /// Distinct owners, sorted.
    pub ownership: Vec<String>,
    /// Hours texts joined with `"; "`, or `Unknown`.
    pub hours: String,
    /// Cost texts joined with `"; "`, or `Unknown`.
    pub parking_cost: String,
    /// Hours texts plus cost texts naming a time unit, deduplicated.
    pub restrictions: Vec<String>,
}

impl StreetParkingAnalysis {
    /// Restrictions joined into the single text the score rules inspect.
    #[must_use]
    pub fn restriction_text(&self) -> String {
        self.restrictions.join("; ")
    }

    /// Whether any free parking period was found.
    #[must_use]
    pub fn free_hours_available(&self) -> bool {
        !self.free_parking_details.is_empty()
    }
}

/// Parking lots near one location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingLotAnalysis {
    /// Whether any lot matched.
    pub has_nearby_lots: bool,
    /// Number of matching lots.
    pub available_lots: usize,
    /// Distinct lot types, sorted.
    pub lot_types: Vec<String>,
    /// Distinct surfaces, sorted.
    pub surfaces: Vec<String>,
    /// `"<name> - 2HR Free"` per free two-hour lot.
    pub free_options: Vec<String>,
    /// Names of lots with accessible spaces.
    pub accessible_lots: Vec<String>,
    /// Sum of known capacities.
    pub total_capacity: u32,
}

/// One named contribution to a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactor {
    /// Factor name, e.g. `infraction_penalty`.
    pub name: String,
    /// Signed contribution, or the normalized factor for the
    /// infraction-rate strategy.
    pub value: f64,
}

/// How a score was assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetails {
    /// Starting score before factors apply.
    pub base_score: f64,
    /// Every factor in evaluation order.
    pub breakdown: Vec<ScoreFactor>,
    /// One line per contributing condition, in evaluation order.
    pub reasoning: Vec<String>,
    /// Score before clamping.
    pub raw_score: f64,
}

/// The complete safety assessment of one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAnalysis {
    /// Location key the analysis belongs to.
    pub location: LocationKey,
    /// Score in `[0, 1]`; higher is safer.
    pub safety_score: f64,
    /// Level derived from the score.
    pub safety_level: SafetyLevel,
    /// Display color for the level.
    pub color: String,
    /// Formula used.
    pub strategy: ScoringStrategy,
    /// Infraction statistics.
    pub infraction_analysis: InfractionAnalysis,
    /// Street parking rules.
    pub street_parking_analysis: StreetParkingAnalysis,
    /// Nearby lots.
    pub parking_lots_analysis: ParkingLotAnalysis,
    /// Ordered advice, safety tier first.
    pub recommendations: Vec<String>,
    /// Plain-language summary lines.
    pub reasoning: Vec<String>,
    /// Factor breakdown.
    pub score_details: ScoreDetails,
    /// Cost texts that name an hourly limit.
    pub time_restrictions: Vec<String>,
    /// Busiest infraction hours, `"HH:00"`.
    pub peak_infraction_times: Vec<String>,
    /// Free periods and hours to avoid.
    pub best_parking_times: Vec<String>,
}

/// Analyses for every known location.
pub type SafetyAnalysisMap = BTreeMap<LocationKey, SafetyAnalysis>;

/// How much data backs a prediction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PredictionConfidence {
    /// No similar locations were found.
    Low,
    /// Averaged over similar locations.
    Medium,
}

/// Estimated safety for a location without direct data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyPrediction {
    /// The queried location, as given.
    pub location: String,
    /// Mean score of similar locations, or `0.5`.
    pub safety_score: f64,
    /// Level derived from the score.
    pub safety_level: SafetyLevel,
    /// Display color for the level.
    pub color: String,
    /// How much data backs the estimate.
    pub confidence: PredictionConfidence,
    /// Number of similar locations averaged.
    pub similar_locations_analyzed: usize,
    /// Mean infraction count of the similar locations.
    pub average_infractions: f64,
    /// Single advice line.
    pub recommendation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comprehensive_is_default_strategy() {
        assert_eq!(ScoringStrategy::default(), ScoringStrategy::Comprehensive);
        assert_eq!(
            "infraction_rate".parse::<ScoringStrategy>().unwrap(),
            ScoringStrategy::InfractionRate
        );
    }

    #[test]
    fn restriction_text_joins_entries() {
        let analysis = StreetParkingAnalysis {
            restrictions: vec!["2HR 8AM-6PM".to_string(), "$2.00/HR".to_string()],
            ..StreetParkingAnalysis::default()
        };
        assert_eq!(analysis.restriction_text(), "2HR 8AM-6PM; $2.00/HR");
        assert!(!analysis.free_hours_available());
    }
}
