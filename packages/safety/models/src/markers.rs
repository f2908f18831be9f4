//! Map marker and coordinate attachment types.

use parking_safety_parking_models::{Coordinates, Dataset, ParkingRecord};
use serde::{Deserialize, Serialize};

use crate::SafetyLevel;

/// A pin on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Source dataset; `None` for safety markers.
    pub dataset: Option<Dataset>,
    /// Where the pin goes.
    pub position: Coordinates,
    /// Short title.
    pub title: String,
    /// Icon URL.
    pub icon: String,
    /// Hex color.
    pub color: String,
    /// Detail text shown in the info window.
    pub description: String,
    /// Score of the location, for safety markers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<f64>,
    /// Level of the location, for safety markers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_level: Option<SafetyLevel>,
}

/// A record with the coordinates it will be drawn at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedRecord {
    /// The record.
    pub record: ParkingRecord,
    /// Cached coordinates, or the default center.
    pub position: Coordinates,
    /// Whether `position` came from the geocode cache.
    pub geocoded: bool,
}

/// How many records received real coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateCoverage {
    /// Records considered.
    pub total_records: usize,
    /// Records placed at cached coordinates.
    pub geocoded: usize,
    /// Records placed at the default center.
    pub defaulted: usize,
}
