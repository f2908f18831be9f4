//! Nearby parking lot analysis.

use std::collections::BTreeSet;

use parking_safety_parking_models::ParkingLotRecord;
use parking_safety_safety_models::ParkingLotAnalysis;

fn lot_name(lot: &ParkingLotRecord) -> &str {
    let name = lot.name.trim();
    if name.is_empty() { "Unknown" } else { name }
}

/// Summarizes the lots matched to one location.
#[must_use]
pub fn analyze_parking_lots(lots: &[&ParkingLotRecord]) -> ParkingLotAnalysis {
    let lot_types: BTreeSet<String> = lots
        .iter()
        .map(|l| l.lot_type.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    let surfaces: BTreeSet<String> = lots
        .iter()
        .map(|l| l.surface.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    ParkingLotAnalysis {
        has_nearby_lots: !lots.is_empty(),
        available_lots: lots.len(),
        lot_types: lot_types.into_iter().collect(),
        surfaces: surfaces.into_iter().collect(),
        free_options: lots
            .iter()
            .filter(|l| l.free_two_hour)
            .map(|l| format!("{} - 2HR Free", lot_name(l)))
            .collect(),
        accessible_lots: lots
            .iter()
            .filter(|l| l.accessible)
            .map(|l| lot_name(l).to_string())
            .collect(),
        total_capacity: lots.iter().filter_map(|l| l.capacity).sum(),
    }
}
