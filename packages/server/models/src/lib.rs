#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the parking safety server.
//!
//! Every response is wrapped in an [`ApiResponse`] envelope:
//! `{"success": bool, "data": ..., "error": "..."}`. Payload types are
//! separate from the analysis types so the API contract can evolve
//! independently.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_safety_parking_models::{
    Coordinates, Dataset, InfractionRecord, ParkingLotRecord, ParkingRecord, StreetParkingRecord,
};
use parking_safety_safety_models::{
    CoordinateCoverage, Marker, SafetyAnalysisMap, SafetyLevel, SafetyPrediction,
    ScoringStrategy, Threshold,
};
use parking_safety_source::RecordFilter;
use serde::{Deserialize, Serialize};

/// The `{success, data | error}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failed response carrying `message`.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `"healthy"` when the server answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Whether a geocoding API key is configured.
    pub geocoding_available: bool,
}

/// `GET /api/data`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiData {
    /// Bylaw infractions.
    pub bylaw_infractions: Vec<InfractionRecord>,
    /// On-street parking segments.
    pub parking_on_street: Vec<StreetParkingRecord>,
    /// Parking lots.
    pub parking_lots: Vec<ParkingLotRecord>,
    /// Record count per dataset.
    pub count: BTreeMap<Dataset, usize>,
}

/// Per-dataset entry of `GET /api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDatasetStats {
    /// Number of records loaded.
    pub total_records: usize,
    /// Column names of the source file.
    pub columns: Vec<String>,
    /// First record, if any.
    pub sample_record: Option<ParkingRecord>,
}

/// Query parameters for `GET /api/safety-analysis` and
/// `GET /api/safety-markers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisQueryParams {
    /// Scoring strategy; comprehensive when absent.
    pub strategy: Option<ScoringStrategy>,
    /// Maximum cache age in hours.
    pub max_age_hours: Option<i64>,
    /// Skip the analysis cache entirely.
    #[serde(default)]
    pub no_cache: bool,
}

/// `GET /api/safety-analysis`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSafetyAnalysis {
    /// Analysis per location.
    pub safety_data: SafetyAnalysisMap,
    /// Number of locations.
    pub total_locations: usize,
    /// Whether the analysis came from the cache.
    pub from_cache: bool,
}

/// Cache provenance of a safety marker response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCacheInfo {
    /// Whether the analysis came from the cache.
    pub used_cache: bool,
    /// When the response was generated.
    pub generated_at: DateTime<Utc>,
}

/// `GET /api/safety-markers`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSafetyMarkers {
    /// One marker per geocoded location.
    pub markers: Vec<Marker>,
    /// Number of markers.
    pub total_locations: usize,
    /// Map center.
    pub center: Coordinates,
    /// Marker count per level.
    pub level_counts: BTreeMap<SafetyLevel, usize>,
    /// Cache provenance.
    pub cache_info: ApiCacheInfo,
}

/// `GET /api/markers` and `POST /api/filter`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMarkers {
    /// One marker per record.
    pub markers: Vec<Marker>,
    /// Number of markers.
    pub count: usize,
    /// How many records received cached coordinates.
    pub coverage: CoordinateCoverage,
    /// Filter that produced the markers, for `POST /api/filter`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters_applied: Option<RecordFilter>,
}

/// One row of `GET /api/safety-thresholds`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiThreshold {
    /// The level.
    pub level: SafetyLevel,
    /// Inclusive lower score bound.
    pub min_score: f64,
    /// Display color.
    pub color: &'static str,
    /// Display label.
    pub label: &'static str,
    /// What the level means for a driver.
    pub description: &'static str,
}

impl From<&Threshold> for ApiThreshold {
    fn from(t: &Threshold) -> Self {
        Self {
            level: t.level,
            min_score: t.min_score,
            color: t.color,
            label: t.level.label(),
            description: threshold_description(t.level),
        }
    }
}

/// Driver-facing description of a level.
#[must_use]
pub const fn threshold_description(level: SafetyLevel) -> &'static str {
    match level {
        SafetyLevel::VerySafe => "Less than 10% infraction rate - Very safe to park",
        SafetyLevel::Safe => "Less than 25% infraction rate - Generally safe to park",
        SafetyLevel::Moderate => "Less than 50% infraction rate - Moderate risk",
        SafetyLevel::Risky => "Less than 75% infraction rate - High chance of ticket",
        SafetyLevel::Dangerous => "75%+ infraction rate - Avoid parking here",
    }
}

/// `POST /api/safety-prediction` body.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRequest {
    /// Free-text location to estimate.
    #[serde(default)]
    pub location: String,
}

/// `POST /api/safety-prediction`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPrediction {
    /// The estimate.
    pub prediction: SafetyPrediction,
    /// When it was computed.
    pub timestamp: DateTime<Utc>,
}

/// `POST /api/geocode/single` body.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeSingleRequest {
    /// Address to resolve.
    #[serde(default)]
    pub address: String,
}

/// `POST /api/geocode/single`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiGeocodeSingle {
    /// The address as requested.
    pub address: String,
    /// Resolved coordinates.
    pub coordinates: Coordinates,
}

/// `POST /api/geocode/process` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodeProcessRequest {
    /// Re-geocode addresses already in the cache.
    #[serde(default)]
    pub force_regeocode: bool,
}

/// `GET /api/geocode/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiGeocodeStatus {
    /// Distinct addresses across the datasets.
    pub total_addresses: usize,
    /// Of those, addresses with cached coordinates.
    pub geocoded_addresses: usize,
    /// `geocoded_addresses` as a percentage of `total_addresses`.
    pub coverage_percent: f64,
    /// Entries in the geocode cache, including addresses no longer in the
    /// datasets.
    pub cached_entries: usize,
    /// Whether a geocoding provider is configured.
    pub geocoding_available: bool,
}

/// `POST /api/cache/clear` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheClearRequest {
    /// Cache kind name, or `"all"` / absent for every kind.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// `POST /api/cache/clear`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCacheCleared {
    /// Kinds that were removed.
    pub cleared: Vec<String>,
    /// Human-readable summary.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_empty_fields() {
        let ok = serde_json::to_value(ApiResponse::ok(3)).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "data": 3}));

        let err = serde_json::to_value(ApiResponse::<()>::err("Location is required")).unwrap();
        assert_eq!(
            err,
            serde_json::json!({"success": false, "error": "Location is required"})
        );
    }

    #[test]
    fn threshold_rows_carry_descriptions() {
        let table = parking_safety_safety_models::ThresholdTable::default();
        let rows: Vec<ApiThreshold> = table.rows().iter().map(ApiThreshold::from).collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].level, SafetyLevel::VerySafe);
        assert!(rows[4].description.starts_with("75%+"));
    }

    #[test]
    fn request_bodies_default_missing_fields() {
        let clear: CacheClearRequest = serde_json::from_str("{}").unwrap();
        assert!(clear.kind.is_none());
        let clear: CacheClearRequest =
            serde_json::from_str(r#"{"type": "safety_analysis"}"#).unwrap();
        assert_eq!(clear.kind.as_deref(), Some("safety_analysis"));

        let process: GeocodeProcessRequest = serde_json::from_str("{}").unwrap();
        assert!(!process.force_regeocode);
    }

    #[test]
    fn analysis_params_parse_strategy() {
        let params: AnalysisQueryParams =
            serde_json::from_str(r#"{"strategy": "infraction_rate", "max_age_hours": 6}"#).unwrap();
        assert_eq!(params.strategy, Some(ScoringStrategy::InfractionRate));
        assert_eq!(params.max_age_hours, Some(6));
        assert!(!params.no_cache);
    }
}
