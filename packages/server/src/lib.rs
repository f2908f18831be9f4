#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the parking safety map.
//!
//! Serves the JSON API consumed by the map frontend. Each request loads
//! the datasets and caches it needs from disk; the process keeps no
//! mutable state between requests, so the CLI and the server can share
//! one cache directory.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use parking_safety_cache::CacheManager;
use parking_safety_geocoder::service_registry::{GeocodingService, google_service};
use parking_safety_geocoder::{Geocoder, GoogleGeocoder};
use parking_safety_parking_models::Coordinates;
use parking_safety_source::DatasetPaths;

/// Default port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 5000;

/// Center of the safety marker map.
pub const MAP_CENTER: Coordinates = Coordinates::new(43.4723, -80.5449);

/// Shared application state.
pub struct AppState {
    /// Dataset file locations.
    pub paths: DatasetPaths,
    /// Cache directory.
    pub caches: CacheManager,
    /// Provider for geocoding requests.
    pub geocoder: Arc<dyn Geocoder>,
    /// Geocoding service configuration (region, default center, pacing).
    pub service: GeocodingService,
    /// Maximum age in days of geocoded coordinates served to the map;
    /// `None` serves every cached coordinate regardless of age.
    pub geocode_max_age_days: Option<i64>,
}

impl AppState {
    /// Builds the state from `PARKING_SAFETY_DATA_DIR`,
    /// `PARKING_SAFETY_CACHE_DIR`, `GOOGLE_MAPS_API_KEY` and
    /// `PARKING_SAFETY_GEOCODE_MAX_AGE_DAYS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            paths: DatasetPaths::from_env(),
            caches: CacheManager::from_env(),
            geocoder: Arc::new(GoogleGeocoder::from_env()),
            service: google_service(),
            geocode_max_age_days: std::env::var("PARKING_SAFETY_GEOCODE_MAX_AGE_DAYS")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
        }
    }
}

/// Registers every `/api` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/data", web::get().to(handlers::data))
            .route("/stats", web::get().to(handlers::stats))
            .route("/safety-analysis", web::get().to(handlers::safety_analysis))
            .route("/safety-markers", web::get().to(handlers::safety_markers))
            .route("/markers", web::get().to(handlers::markers))
            .route(
                "/safety-thresholds",
                web::get().to(handlers::safety_thresholds),
            )
            .route("/filter", web::post().to(handlers::filter))
            .route(
                "/safety-prediction",
                web::post().to(handlers::safety_prediction),
            )
            .route("/geocode/single", web::post().to(handlers::geocode_single))
            .route("/geocode/status", web::get().to(handlers::geocode_status))
            .route(
                "/geocode/process",
                web::post().to(handlers::geocode_process),
            )
            .route("/cache/status", web::get().to(handlers::cache_status))
            .route("/cache/clear", web::post().to(handlers::cache_clear)),
    );
}

/// Starts the parking safety API server.
///
/// Reads configuration from the environment and binds to `BIND_ADDR`
/// (default `127.0.0.1`) and `PORT` (default `5000`). The caller is
/// responsible for initializing logging and providing the async runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let state = web::Data::new(AppState::from_env());

    log::info!(
        "Data directory: {}",
        state
            .paths
            .bylaw_infractions
            .parent()
            .map_or_else(|| ".".into(), |p| p.display().to_string())
    );
    log::info!("Cache directory: {}", state.caches.dir().display());
    log::info!(
        "Geocoding available: {}",
        state.geocoder.is_available()
    );

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
