use parking_safety_safety_models::{SafetyAnalysis, SafetyAnalysisMap};

/// Finds analysed locations whose key contains `term`, ignoring case.
///
/// Results are ordered safest first; equal scores keep key order. A blank
/// term matches nothing.
#[must_use]
pub fn search_locations<'a>(analysis: &'a SafetyAnalysisMap, term: &str) -> Vec<&'a SafetyAnalysis> {
    let needle = term.trim().to_uppercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<&SafetyAnalysis> = analysis
        .iter()
        .filter(|(key, _)| key.as_str().contains(&needle))
        .map(|(_, a)| a)
        .collect();

    matches.sort_by(|a, b| b.safety_score.total_cmp(&a.safety_score));
    matches
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use parking_safety_parking_models::InfractionRecord;
    use parking_safety_source::Datasets;

    use super::*;
    use crate::SafetyEngine;

    fn analysis() -> SafetyAnalysisMap {
        let ticket = |street: &str| InfractionRecord {
            street: street.to_string(),
            date: "3/20/2024".to_string(),
            reason: "NO PARKING".to_string(),
            ..InfractionRecord::default()
        };
        let mut infractions: Vec<InfractionRecord> = (0..40).map(|_| ticket("KING ST N")).collect();
        infractions.push(ticket("KING ST S"));
        infractions.push(ticket("ERB ST W"));

        let datasets = Datasets {
            infractions,
            ..Datasets::default()
        };
        SafetyEngine::default()
            .with_today(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())
            .analyze_all(&datasets)
    }

    #[test]
    fn matches_substring_case_insensitively() {
        let map = analysis();
        let found = search_locations(&map, "king");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|a| a.location.as_str().starts_with("KING")));
    }

    #[test]
    fn sorted_safest_first() {
        let map = analysis();
        let found = search_locations(&map, " st ");
        assert_eq!(found.len(), 3);
        assert!(
            found
                .windows(2)
                .all(|w| w[0].safety_score >= w[1].safety_score)
        );
        assert_eq!(found[2].location.as_str(), "KING ST N");
    }

    #[test]
    fn blank_or_unknown_term_finds_nothing() {
        let map = analysis();
        assert!(search_locations(&map, "   ").is_empty());
        assert!(search_locations(&map, "columbia").is_empty());
    }
}
