//! Safety levels and the score-to-level threshold table.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Discrete safety classification derived from a score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SafetyLevel {
    /// Score of at least 0.8.
    VerySafe,
    /// Score of at least 0.6.
    Safe,
    /// Score of at least 0.4.
    Moderate,
    /// Score of at least 0.2.
    Risky,
    /// Anything lower.
    Dangerous,
}

impl SafetyLevel {
    /// Returns all variants, safest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::VerySafe,
            Self::Safe,
            Self::Moderate,
            Self::Risky,
            Self::Dangerous,
        ]
    }

    /// Hex display color used on the map.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::VerySafe => "#00FF00",
            Self::Safe => "#90EE90",
            Self::Moderate => "#FFFF00",
            Self::Risky => "#FFA500",
            Self::Dangerous => "#FF0000",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VerySafe => "Very Safe",
            Self::Safe => "Safe",
            Self::Moderate => "Moderate",
            Self::Risky => "Risky",
            Self::Dangerous => "Dangerous",
        }
    }
}

/// One row of the threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    /// Level assigned at or above `min_score`.
    pub level: SafetyLevel,
    /// Inclusive lower bound.
    pub min_score: f64,
    /// Display color for the level.
    pub color: &'static str,
}

/// Ordered, inclusive lower bounds mapping scores to levels.
///
/// Rows are sorted by descending `min_score`; the first row whose bound
/// the score reaches wins. The last row has a bound of `0.0` so every
/// clamped score maps to some level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdTable {
    rows: Vec<Threshold>,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let bounds = [0.8, 0.6, 0.4, 0.2, 0.0];
        let rows = SafetyLevel::all()
            .iter()
            .zip(bounds)
            .map(|(level, min_score)| Threshold {
                level: *level,
                min_score,
                color: level.color(),
            })
            .collect();
        Self { rows }
    }
}

impl ThresholdTable {
    /// Maps a score to its level. Scores are clamped to `[0, 1]` first;
    /// `NaN` maps to the lowest level.
    #[must_use]
    pub fn level_for(&self, score: f64) -> SafetyLevel {
        let score = clamp_score(score);
        self.rows
            .iter()
            .find(|row| score >= row.min_score)
            .map_or(SafetyLevel::Dangerous, |row| row.level)
    }

    /// Table rows, safest first.
    #[must_use]
    pub fn rows(&self) -> &[Threshold] {
        &self.rows
    }
}

/// Clamps a score into `[0, 1]`, mapping `NaN` to `0`.
#[must_use]
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_mapping_examples() {
        let table = ThresholdTable::default();
        assert_eq!(table.level_for(0.85), SafetyLevel::VerySafe);
        assert_eq!(table.level_for(0.75), SafetyLevel::Safe);
        assert_eq!(table.level_for(0.55), SafetyLevel::Moderate);
        assert_eq!(table.level_for(0.35), SafetyLevel::Risky);
        assert_eq!(table.level_for(0.05), SafetyLevel::Dangerous);
    }

    #[test]
    fn bounds_are_inclusive() {
        let table = ThresholdTable::default();
        assert_eq!(table.level_for(0.8), SafetyLevel::VerySafe);
        assert_eq!(table.level_for(0.6), SafetyLevel::Safe);
        assert_eq!(table.level_for(0.4), SafetyLevel::Moderate);
        assert_eq!(table.level_for(0.2), SafetyLevel::Risky);
        assert_eq!(table.level_for(0.0), SafetyLevel::Dangerous);
    }

    #[test]
    fn mapping_is_monotonic() {
        let table = ThresholdTable::default();
        let mut previous = SafetyLevel::Dangerous;
        for step in 0..=100 {
            let level = table.level_for(f64::from(step) / 100.0);
            assert!(level <= previous, "level got less safe at step {step}");
            previous = level;
        }
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        let table = ThresholdTable::default();
        assert_eq!(table.level_for(1.7), SafetyLevel::VerySafe);
        assert_eq!(table.level_for(-3.0), SafetyLevel::Dangerous);
        assert_eq!(table.level_for(f64::NAN), SafetyLevel::Dangerous);
    }

    #[test]
    fn colors() {
        assert_eq!(SafetyLevel::Safe.color(), "#90EE90");
        assert_eq!(SafetyLevel::Dangerous.to_string(), "dangerous");
        assert_eq!(ThresholdTable::default().rows().len(), 5);
    }
}
