//! Score composition for both scoring strategies.
//!
//! Both return the clamped score together with the [`ScoreDetails`] that
//! explain it. Level mapping is done by the caller through the shared
//! threshold table.

use parking_safety_safety_models::{
    InfractionAnalysis, ParkingLotAnalysis, ScoreDetails, ScoreFactor, StreetParkingAnalysis,
    clamp_score,
};

/// Starting score of the comprehensive strategy.
pub const BASE_SCORE: f64 = 0.5;

/// Days the infraction total is spread over to get a daily rate.
const RATE_WINDOW_DAYS: f64 = 30.0;

/// Spot estimate for the infraction-rate strategy when a location has no
/// street parking segments.
pub const DEFAULT_SPOT_ESTIMATE: usize = 10;

const TIME_LIMIT_MARKERS: &[&str] = &["2HR", "1HR", "30MIN"];

struct Breakdown {
    factors: Vec<ScoreFactor>,
    reasoning: Vec<String>,
}

impl Breakdown {
    const fn new() -> Self {
        Self {
            factors: Vec::new(),
            reasoning: Vec::new(),
        }
    }

    fn factor(&mut self, name: &str, value: f64) {
        self.factors.push(ScoreFactor {
            name: name.to_string(),
            value,
        });
    }

    fn total(&self) -> f64 {
        self.factors.iter().map(|f| f.value).sum()
    }
}

/// Multi-factor score over infractions, street rules and nearby lots.
#[must_use]
pub fn comprehensive_score(
    infractions: &InfractionAnalysis,
    street: &StreetParkingAnalysis,
    lots: &ParkingLotAnalysis,
) -> (f64, ScoreDetails) {
    let mut b = Breakdown::new();

    #[allow(clippy::cast_precision_loss)]
    let rate = infractions.total_count as f64 / RATE_WINDOW_DAYS;
    let infraction_penalty = if infractions.total_count == 0 {
        b.reasoning
            .push("No infractions recorded at this location".to_string());
        0.1
    } else if rate > 50.0 {
        b.reasoning
            .push(format!("High infraction rate: {rate:.1}/day"));
        -0.3
    } else if rate > 20.0 {
        b.reasoning
            .push(format!("Moderate infraction rate: {rate:.1}/day"));
        -0.2
    } else if rate > 5.0 {
        b.reasoning
            .push(format!("Low infraction rate: {rate:.1}/day"));
        -0.1
    } else {
        b.reasoning
            .push(format!("Very low infraction rate: {rate:.1}/day"));
        0.0
    };
    b.factor("infraction_penalty", infraction_penalty);

    let mut free_parking_bonus = 0.0;
    let mut paid_parking_penalty = 0.0;
    let mut time_restriction_bonus = 0.0;

    if street.has_street_parking {
        if street.free_hours_available() {
            free_parking_bonus = 0.15;
            b.reasoning.push(format!(
                "Free parking available: {}",
                street.free_parking_details.join(", ")
            ));
        }

        if let Some(rate) = street.hourly_rate
            && rate > 0.0
        {
            paid_parking_penalty = -0.1;
            b.reasoning.push(format!("Paid parking: ${rate:.2}/hr"));
        }

        let restrictions = street.restriction_text();
        let upper = restrictions.to_uppercase();
        if upper.contains("FREE") {
            time_restriction_bonus = 0.1;
            b.reasoning
                .push(format!("Free parking hours: {restrictions}"));
        } else if TIME_LIMIT_MARKERS.iter().any(|m| upper.contains(m)) {
            time_restriction_bonus = 0.05;
            b.reasoning
                .push(format!("Time-limited parking: {restrictions}"));
        }
    }
    b.factor("free_parking_bonus", free_parking_bonus);
    b.factor("paid_parking_penalty", paid_parking_penalty);
    b.factor("time_restriction_bonus", time_restriction_bonus);

    let availability_bonus = if lots.available_lots > 0 {
        b.reasoning
            .push(format!("{} nearby parking lot(s)", lots.available_lots));
        #[allow(clippy::cast_precision_loss)]
        let bonus = lots.available_lots as f64 * 0.02;
        bonus.min(0.1)
    } else {
        0.0
    };
    b.factor("availability_bonus", availability_bonus);

    let enforcement_risk = if infractions.recent_count > 10 {
        b.reasoning.push(format!(
            "High enforcement activity: {} recent infractions",
            infractions.recent_count
        ));
        -0.15
    } else if infractions.recent_count > 5 {
        b.reasoning.push(format!(
            "Moderate enforcement activity: {} recent infractions",
            infractions.recent_count
        ));
        -0.05
    } else {
        0.0
    };
    b.factor("enforcement_risk", enforcement_risk);

    let raw_score = BASE_SCORE + b.total();
    let score = clamp_score(raw_score);

    (
        score,
        ScoreDetails {
            base_score: BASE_SCORE,
            breakdown: b.factors,
            reasoning: b.reasoning,
            raw_score,
        },
    )
}

/// Normalized infraction totals, recency, severity and per-spot rate.
///
/// `spots` is the number of street parking segments at the location;
/// [`DEFAULT_SPOT_ESTIMATE`] is used when there are none.
#[must_use]
pub fn infraction_rate_score(infractions: &InfractionAnalysis, spots: usize) -> (f64, ScoreDetails) {
    let spots = if spots == 0 { DEFAULT_SPOT_ESTIMATE } else { spots };

    #[allow(clippy::cast_precision_loss)]
    let (total, recent, spots) = (
        infractions.total_count as f64,
        infractions.recent_count as f64,
        spots as f64,
    );

    let total_factor = (1.0 - total / 100.0).max(0.0);
    let recent_factor = (1.0 - recent / 20.0).max(0.0);
    let severity_factor = (1.0 - infractions.severity_score / 2.0).max(0.0);
    let rate_factor = (1.0 - (total / spots) / 5.0).max(0.0);

    let raw_score =
        0.2 * total_factor + 0.4 * recent_factor + 0.2 * severity_factor + 0.2 * rate_factor;

    let mut b = Breakdown::new();
    b.factor("total_factor", total_factor);
    b.factor("recent_factor", recent_factor);
    b.factor("severity_factor", severity_factor);
    b.factor("rate_factor", rate_factor);

    if infractions.total_count == 0 {
        b.reasoning
            .push("No infractions recorded at this location".to_string());
    } else {
        b.reasoning.push(format!(
            "{} total infractions, {} recent",
            infractions.total_count, infractions.recent_count
        ));
        b.reasoning.push(format!(
            "Average severity {:.2}, {:.1} infractions per spot",
            infractions.severity_score,
            total / spots
        ));
    }

    (
        clamp_score(raw_score),
        ScoreDetails {
            base_score: 0.0,
            breakdown: b.factors,
            reasoning: b.reasoning,
            raw_score,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infractions(total: usize, recent: usize, severity: f64) -> InfractionAnalysis {
        InfractionAnalysis {
            total_count: total,
            recent_count: recent,
            severity_score: severity,
            ..InfractionAnalysis::default()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn zero_infractions_and_no_parking_data() {
        let (score, details) = comprehensive_score(
            &InfractionAnalysis::default(),
            &StreetParkingAnalysis::default(),
            &ParkingLotAnalysis::default(),
        );
        assert!(approx(score, 0.6));
        assert!(
            details
                .reasoning
                .iter()
                .any(|r| r.to_lowercase().contains("no infractions"))
        );
        assert_eq!(details.breakdown.len(), 6);
    }

    #[test]
    fn infraction_tiers() {
        let none = StreetParkingAnalysis::default();
        let lots = ParkingLotAnalysis::default();
        let cases = [(100, 0.5), (151, 0.4), (601, 0.3), (1501, 0.2)];
        for (total, expected) in cases {
            let (score, _) = comprehensive_score(&infractions(total, 0, 1.0), &none, &lots);
            assert!(approx(score, expected), "total {total} gave {score}");
        }
    }

    #[test]
    fn street_factors() {
        let street = StreetParkingAnalysis {
            has_street_parking: true,
            free_parking_details: vec!["FREE AFTER 6PM".to_string()],
            hourly_rate: Some(2.0),
            restrictions: vec!["2HR 8AM-6PM".to_string()],
            ..StreetParkingAnalysis::default()
        };
        let (score, details) = comprehensive_score(
            &infractions(30, 0, 1.0),
            &street,
            &ParkingLotAnalysis::default(),
        );
        assert!(approx(score, 0.5 + 0.15 - 0.1 + 0.05));
        assert!(details.reasoning.iter().any(|r| r.starts_with("Time-limited")));
    }

    #[test]
    fn street_factors_ignored_without_street_parking() {
        let street = StreetParkingAnalysis {
            free_parking_details: vec!["FREE".to_string()],
            ..StreetParkingAnalysis::default()
        };
        let (score, _) = comprehensive_score(
            &infractions(30, 0, 1.0),
            &street,
            &ParkingLotAnalysis::default(),
        );
        assert!(approx(score, 0.5));
    }

    #[test]
    fn lot_bonus_is_capped() {
        let lots = ParkingLotAnalysis {
            available_lots: 9,
            ..ParkingLotAnalysis::default()
        };
        let (score, _) = comprehensive_score(
            &infractions(30, 0, 1.0),
            &StreetParkingAnalysis::default(),
            &lots,
        );
        assert!(approx(score, 0.6));
    }

    #[test]
    fn enforcement_and_clamping() {
        let (score, details) = comprehensive_score(
            &infractions(5000, 50, 2.0),
            &StreetParkingAnalysis::default(),
            &ParkingLotAnalysis::default(),
        );
        assert!(approx(score, 0.05));
        assert!(approx(details.raw_score, 0.05));

        let (score, _) = comprehensive_score(
            &infractions(200, 7, 1.0),
            &StreetParkingAnalysis::default(),
            &ParkingLotAnalysis::default(),
        );
        assert!(approx(score, 0.5 - 0.1 - 0.05));
    }

    #[test]
    fn infraction_rate_zero_is_perfect() {
        let (score, _) = infraction_rate_score(&InfractionAnalysis::default(), 0);
        assert!(approx(score, 1.0));
    }

    #[test]
    fn infraction_rate_formula() {
        let (score, details) = infraction_rate_score(&infractions(50, 10, 1.0), 0);
        // total 0.5, recent 0.5, severity 0.5, rate max(0, 1 - 5/5) = 0
        assert!(approx(score, 0.1 + 0.2 + 0.1));
        assert_eq!(details.breakdown[3].name, "rate_factor");

        let (score, _) = infraction_rate_score(&infractions(500, 100, 4.0), 2);
        assert!(approx(score, 0.0));
    }
}
