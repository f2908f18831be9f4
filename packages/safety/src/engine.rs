//! The scoring engine: turns grouped records into [`SafetyAnalysis`]
//! values and estimates unknown locations.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use parking_safety_parking_models::LocationKey;
use parking_safety_safety_models::{
    PredictionConfidence, SafetyAnalysis, SafetyAnalysisMap, SafetyPrediction, ScoringStrategy,
    ThresholdTable,
};
use parking_safety_source::Datasets;

use crate::aggregator::{LocationAggregator, LocationRecords};
use crate::infractions::analyze_infractions;
use crate::lots::analyze_parking_lots;
use crate::recommendations::{best_parking_times, level_advice, reasoning, recommendations};
use crate::score::{comprehensive_score, infraction_rate_score};
use crate::street::{analyze_street_parking, time_restrictions};

/// Scores locations with a fixed strategy and reference date.
#[derive(Debug, Clone)]
pub struct SafetyEngine {
    strategy: ScoringStrategy,
    today: NaiveDate,
    thresholds: ThresholdTable,
}

impl Default for SafetyEngine {
    fn default() -> Self {
        Self::new(ScoringStrategy::default())
    }
}

impl SafetyEngine {
    /// Creates an engine using today's local date for recency.
    #[must_use]
    pub fn new(strategy: ScoringStrategy) -> Self {
        Self {
            strategy,
            today: chrono::Local::now().date_naive(),
            thresholds: ThresholdTable::default(),
        }
    }

    /// Overrides the reference date used for the recency window.
    #[must_use]
    pub const fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// The strategy this engine scores with.
    #[must_use]
    pub const fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    /// The threshold table used for level mapping.
    #[must_use]
    pub const fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Scores one location from its grouped records.
    #[must_use]
    pub fn analyze_location(
        &self,
        location: &LocationKey,
        records: &LocationRecords<'_>,
    ) -> SafetyAnalysis {
        let infraction_analysis = analyze_infractions(&records.infractions, self.today);
        let street_parking_analysis = analyze_street_parking(&records.street_parking);
        let parking_lots_analysis = analyze_parking_lots(&records.parking_lots);

        let (safety_score, score_details) = match self.strategy {
            ScoringStrategy::Comprehensive => comprehensive_score(
                &infraction_analysis,
                &street_parking_analysis,
                &parking_lots_analysis,
            ),
            ScoringStrategy::InfractionRate => {
                infraction_rate_score(&infraction_analysis, records.street_parking.len())
            }
        };

        let safety_level = self.thresholds.level_for(safety_score);

        SafetyAnalysis {
            location: location.clone(),
            safety_score,
            safety_level,
            color: safety_level.color().to_string(),
            strategy: self.strategy,
            recommendations: recommendations(
                safety_score,
                &infraction_analysis,
                &street_parking_analysis,
                &parking_lots_analysis,
            ),
            reasoning: reasoning(
                safety_score,
                &infraction_analysis,
                &street_parking_analysis,
                &parking_lots_analysis,
            ),
            time_restrictions: time_restrictions(&records.street_parking),
            peak_infraction_times: infraction_analysis.peak_times.clone(),
            best_parking_times: best_parking_times(
                &street_parking_analysis,
                &infraction_analysis,
            ),
            score_details,
            infraction_analysis,
            street_parking_analysis,
            parking_lots_analysis,
        }
    }

    /// Scores every location found across the datasets.
    #[must_use]
    pub fn analyze_all(&self, datasets: &Datasets) -> SafetyAnalysisMap {
        let aggregator = LocationAggregator::new(datasets);
        let locations = aggregator.locations();
        log::info!(
            "Analyzing {} locations with {} strategy",
            locations.len(),
            self.strategy
        );

        locations
            .into_iter()
            .map(|key| {
                let records = aggregator.records_for(&key);
                let analysis = self.analyze_location(&key, &records);
                (key, analysis)
            })
            .collect()
    }

    /// Estimates the safety of a location from known infraction streets
    /// that share at least one word with it.
    ///
    /// Each similar street is scored with the infraction-rate strategy
    /// over its infractions alone and the scores are averaged.
    #[must_use]
    pub fn predict(&self, location: &str, datasets: &Datasets) -> SafetyPrediction {
        let words: BTreeSet<String> = location
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        let infraction_streets: BTreeSet<LocationKey> = datasets
            .infractions
            .iter()
            .filter_map(|r| LocationKey::new(&r.street))
            .collect();

        let aggregator = LocationAggregator::new(datasets);
        let similar: Vec<(f64, usize)> = infraction_streets
            .iter()
            .filter(|key| {
                key.as_str()
                    .split_whitespace()
                    .any(|w| words.contains(&w.to_lowercase()))
            })
            .map(|key| {
                let records = aggregator.records_for(key);
                let analysis = analyze_infractions(&records.infractions, self.today);
                let (score, _) = infraction_rate_score(&analysis, 0);
                (score, analysis.total_count)
            })
            .collect();

        if similar.is_empty() {
            let level = self.thresholds.level_for(0.5);
            return SafetyPrediction {
                location: location.to_string(),
                safety_score: 0.5,
                safety_level: level,
                color: level.color().to_string(),
                confidence: PredictionConfidence::Low,
                similar_locations_analyzed: 0,
                average_infractions: 0.0,
                recommendation: "Limited data available. Park with caution.".to_string(),
            };
        }

        #[allow(clippy::cast_precision_loss)]
        let count = similar.len() as f64;
        let safety_score = similar.iter().map(|(s, _)| s).sum::<f64>() / count;
        #[allow(clippy::cast_precision_loss)]
        let average_infractions = similar.iter().map(|(_, n)| *n as f64).sum::<f64>() / count;
        let level = self.thresholds.level_for(safety_score);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let advice = level_advice(level, average_infractions as usize, 0);

        SafetyPrediction {
            location: location.to_string(),
            safety_score,
            safety_level: level,
            color: level.color().to_string(),
            confidence: PredictionConfidence::Medium,
            similar_locations_analyzed: similar.len(),
            average_infractions,
            recommendation: format!(
                "Based on {} similar locations. {advice}",
                similar.len()
            ),
        }
    }
}
