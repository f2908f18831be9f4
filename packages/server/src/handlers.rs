//! HTTP handler functions for the parking safety API.

use std::collections::BTreeMap;
use std::str::FromStr as _;

use actix_web::{HttpResponse, web};
use chrono::Utc;
use parking_safety_cache::CacheKind;
use parking_safety_cache::geocode::GeocodeMap;
use parking_safety_geocoder::{GeocodeError, GeocodingReport, geocode_all};
use parking_safety_parking_models::{Dataset, ParkingRecord};
use parking_safety_safety::markers::{
    attach_coordinates, record_markers, safety_markers as build_safety_markers,
};
use parking_safety_safety::{AnalysisRun, CachePolicy, SafetyEngine, run_analysis};
use parking_safety_safety_models::SafetyLevel;
use parking_safety_server_models::{
    AnalysisQueryParams, ApiCacheCleared, ApiCacheInfo, ApiData, ApiDatasetStats, ApiGeocodeSingle,
    ApiGeocodeStatus,
    ApiHealth, ApiMarkers, ApiPrediction, ApiResponse, ApiSafetyAnalysis, ApiSafetyMarkers,
    ApiThreshold, CacheClearRequest, GeocodeProcessRequest, GeocodeSingleRequest,
    PredictionRequest,
};
use parking_safety_source::progress::NullProgress;
use parking_safety_source::{Datasets, RecordFilter, load_datasets, unique_addresses};
use serde::Serialize;

use crate::{AppState, MAP_CENTER};

fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(data))
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::<()>::err(message))
}

fn not_found(message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::<()>::err(message))
}

fn internal_error(message: impl Into<String>) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiResponse::<()>::err(message))
}

fn load(state: &AppState) -> Result<Datasets, HttpResponse> {
    load_datasets(&state.paths).map_err(|e| {
        log::error!("Failed to load datasets: {e}");
        internal_error(e.to_string())
    })
}

fn analyze(state: &AppState, params: &AnalysisQueryParams) -> Result<AnalysisRun, HttpResponse> {
    let engine = SafetyEngine::new(params.strategy.unwrap_or_default());
    let policy = if params.no_cache {
        CachePolicy::disabled()
    } else {
        params
            .max_age_hours
            .map_or_else(CachePolicy::default, CachePolicy::max_age_hours)
    };

    run_analysis(&engine, &state.paths, &state.caches.analysis(), policy).map_err(|e| {
        log::error!("Failed to analyze safety: {e}");
        internal_error(e.to_string())
    })
}

fn cached_geocodes(state: &AppState) -> GeocodeMap {
    let cache = state.caches.geocode();
    match state.geocode_max_age_days {
        Some(days) => cache.load(days).unwrap_or_default(),
        None => cache.load_any(),
    }
}

fn record_marker_response(
    state: &AppState,
    datasets: &Datasets,
    filters_applied: Option<RecordFilter>,
) -> HttpResponse {
    let geocodes = cached_geocodes(state);
    let (located, coverage) =
        attach_coordinates(datasets, &geocodes, state.service.default_center);
    let markers = record_markers(&located);

    ok(ApiMarkers {
        count: markers.len(),
        markers,
        coverage,
        filters_applied,
    })
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    ok(ApiHealth {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        geocoding_available: state.geocoder.is_available(),
    })
}

/// `GET /api/data`
///
/// Returns every loaded record with per-dataset counts.
pub async fn data(state: web::Data<AppState>) -> HttpResponse {
    let datasets = match load(&state) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let count: BTreeMap<Dataset, usize> = Dataset::all()
        .iter()
        .map(|d| (*d, datasets.count(*d)))
        .collect();

    ok(ApiData {
        bylaw_infractions: datasets.infractions,
        parking_on_street: datasets.street_parking,
        parking_lots: datasets.parking_lots,
        count,
    })
}

/// `GET /api/stats`
///
/// Record count, source columns and a sample record per non-empty dataset.
pub async fn stats(state: web::Data<AppState>) -> HttpResponse {
    let datasets = match load(&state) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let sample = |dataset: Dataset| -> Option<ParkingRecord> {
        match dataset {
            Dataset::BylawInfractions => datasets
                .infractions
                .first()
                .cloned()
                .map(ParkingRecord::BylawInfractions),
            Dataset::ParkingOnStreet => datasets
                .street_parking
                .first()
                .cloned()
                .map(ParkingRecord::ParkingOnStreet),
            Dataset::ParkingLots => datasets
                .parking_lots
                .first()
                .cloned()
                .map(ParkingRecord::ParkingLots),
        }
    };

    let stats: BTreeMap<Dataset, ApiDatasetStats> = Dataset::all()
        .iter()
        .filter(|d| datasets.count(**d) > 0)
        .map(|d| {
            (
                *d,
                ApiDatasetStats {
                    total_records: datasets.count(*d),
                    columns: datasets.columns(*d).to_vec(),
                    sample_record: sample(*d),
                },
            )
        })
        .collect();

    ok(stats)
}

/// `GET /api/safety-analysis`
///
/// Serves the cached analysis when valid, otherwise recomputes it.
pub async fn safety_analysis(
    state: web::Data<AppState>,
    params: web::Query<AnalysisQueryParams>,
) -> HttpResponse {
    match analyze(&state, &params) {
        Ok(run) => ok(ApiSafetyAnalysis {
            total_locations: run.analysis.len(),
            safety_data: run.analysis,
            from_cache: run.from_cache,
        }),
        Err(resp) => resp,
    }
}

/// `GET /api/safety-markers`
///
/// One marker per analysed location that has cached coordinates.
pub async fn safety_markers(
    state: web::Data<AppState>,
    params: web::Query<AnalysisQueryParams>,
) -> HttpResponse {
    let run = match analyze(&state, &params) {
        Ok(run) => run,
        Err(resp) => return resp,
    };

    let geocodes = cached_geocodes(&state);
    if geocodes.is_empty() {
        return not_found("No geocoded data available. Please run geocoding first.");
    }

    let markers = build_safety_markers(&run.analysis, &geocodes);

    let mut level_counts: BTreeMap<SafetyLevel, usize> =
        SafetyLevel::all().iter().map(|l| (*l, 0)).collect();
    for level in markers.iter().filter_map(|m| m.safety_level) {
        *level_counts.entry(level).or_default() += 1;
    }

    ok(ApiSafetyMarkers {
        total_locations: markers.len(),
        markers,
        center: MAP_CENTER,
        level_counts,
        cache_info: ApiCacheInfo {
            used_cache: run.from_cache,
            generated_at: Utc::now(),
        },
    })
}

/// `GET /api/markers`
pub async fn markers(state: web::Data<AppState>) -> HttpResponse {
    match load(&state) {
        Ok(datasets) => record_marker_response(&state, &datasets, None),
        Err(resp) => resp,
    }
}

/// `GET /api/safety-thresholds`
pub async fn safety_thresholds() -> HttpResponse {
    let engine = SafetyEngine::default();
    let rows: Vec<ApiThreshold> = engine
        .thresholds()
        .rows()
        .iter()
        .map(ApiThreshold::from)
        .collect();
    ok(rows)
}

/// `POST /api/filter`
///
/// Record markers for the records matching the posted filter. A missing
/// body matches everything.
pub async fn filter(
    state: web::Data<AppState>,
    body: Option<web::Json<RecordFilter>>,
) -> HttpResponse {
    let filter = body.map(web::Json::into_inner).unwrap_or_default();
    let datasets = match load(&state) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let filtered = filter.apply(&datasets);
    log::debug!(
        "Filter kept {} of {} records",
        filtered.total_records(),
        datasets.total_records()
    );

    record_marker_response(&state, &filtered, Some(filter))
}

/// `POST /api/safety-prediction`
pub async fn safety_prediction(
    state: web::Data<AppState>,
    body: Option<web::Json<PredictionRequest>>,
) -> HttpResponse {
    let location = body
        .map(|b| b.into_inner().location)
        .unwrap_or_default();
    let location = location.trim();
    if location.is_empty() {
        return bad_request("Location is required");
    }

    let datasets = match load(&state) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    ok(ApiPrediction {
        prediction: SafetyEngine::default().predict(location, &datasets),
        timestamp: Utc::now(),
    })
}

/// `POST /api/geocode/single`
pub async fn geocode_single(
    state: web::Data<AppState>,
    body: Option<web::Json<GeocodeSingleRequest>>,
) -> HttpResponse {
    let address = body.map(|b| b.into_inner().address).unwrap_or_default();
    let address = address.trim();
    if address.is_empty() {
        return bad_request("Address is required");
    }

    match state.geocoder.geocode(address).await {
        Ok(Some(coordinates)) => ok(ApiGeocodeSingle {
            address: address.to_string(),
            coordinates,
        }),
        Ok(None) => not_found(format!("Could not geocode address: {address}")),
        Err(GeocodeError::Unavailable) => bad_request("Google Maps API key not configured"),
        Err(e) => {
            log::error!("Failed to geocode {address}: {e}");
            internal_error(e.to_string())
        }
    }
}

#[derive(Serialize)]
struct ApiGeocodeProcess {
    force_regeocode: bool,
    #[serde(flatten)]
    report: GeocodingReport,
}

/// `POST /api/geocode/process`
///
/// Geocodes every address the geocode cache does not hold yet.
pub async fn geocode_process(
    state: web::Data<AppState>,
    body: Option<web::Json<GeocodeProcessRequest>>,
) -> HttpResponse {
    let force = body.is_some_and(|b| b.force_regeocode);

    if !state.geocoder.is_available() {
        return bad_request("Google Maps API key not configured");
    }

    let datasets = match load(&state) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match geocode_all(
        state.geocoder.as_ref(),
        &datasets,
        &state.caches.geocode(),
        force,
        state.service.rate_limit,
        &NullProgress,
    )
    .await
    {
        Ok(report) => ok(ApiGeocodeProcess {
            force_regeocode: force,
            report,
        }),
        Err(e) => {
            log::error!("Batch geocoding failed: {e}");
            internal_error(e.to_string())
        }
    }
}

/// `GET /api/geocode/status`
///
/// How many dataset addresses the geocode cache covers, regardless of the
/// cache's age.
pub async fn geocode_status(state: web::Data<AppState>) -> HttpResponse {
    let datasets = match load(&state) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let cached = state.caches.geocode().load_any();
    let addresses = unique_addresses(&datasets);
    let geocoded = addresses
        .iter()
        .filter(|a| cached.contains_key(a.as_str()))
        .count();

    #[allow(clippy::cast_precision_loss)]
    let coverage_percent = if addresses.is_empty() {
        0.0
    } else {
        (geocoded as f64 / addresses.len() as f64 * 1000.0).round() / 10.0
    };

    ok(ApiGeocodeStatus {
        total_addresses: addresses.len(),
        geocoded_addresses: geocoded,
        coverage_percent,
        cached_entries: cached.len(),
        geocoding_available: state.geocoder.is_available(),
    })
}

/// `GET /api/cache/status`
pub async fn cache_status(state: web::Data<AppState>) -> HttpResponse {
    ok(state.caches.status())
}

/// `POST /api/cache/clear`
///
/// Body `{"type": "<kind>"}`; `"all"` or no body clears every cache.
pub async fn cache_clear(
    state: web::Data<AppState>,
    body: Option<web::Json<CacheClearRequest>>,
) -> HttpResponse {
    let requested = body.and_then(|b| b.into_inner().kind);
    let kind = match requested.as_deref() {
        None | Some("all") => None,
        Some(name) => match CacheKind::from_str(name) {
            Ok(kind) => Some(kind),
            Err(_) => return bad_request(format!("Unknown cache type: {name}")),
        },
    };

    match state.caches.clear(kind) {
        Ok(cleared) => {
            let cleared: Vec<String> = cleared.iter().map(ToString::to_string).collect();
            let message = if cleared.is_empty() {
                "No caches to clear".to_string()
            } else {
                format!("Cleared caches: {}", cleared.join(", "))
            };
            ok(ApiCacheCleared { cleared, message })
        }
        Err(e) => {
            log::error!("Failed to clear cache: {e}");
            internal_error(e.to_string())
        }
    }
}
