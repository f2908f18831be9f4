#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for parking records.
//!
//! Converts record addresses to latitude/longitude using the Google
//! Geocoding API, configured via the TOML file embedded from `services/`
//! (see [`service_registry`]). [`batch::geocode_all`] resolves every
//! distinct address of the loaded datasets that the geocode cache does
//! not know yet, pacing requests per the service's rate limit.

pub mod address;
pub mod batch;
pub mod google;
pub mod service_registry;

use parking_safety_parking_models::Coordinates;
use thiserror::Error;

pub use batch::{GeocodingReport, geocode_all};
pub use google::GoogleGeocoder;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider rejected the request.
    #[error("Geocoding API error {status}: {message}")]
    Api {
        /// Provider status code (e.g., `"REQUEST_DENIED"`).
        status: String,
        /// Provider error message, if any.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Writing the geocode cache failed.
    #[error("Cache error: {0}")]
    Cache(#[from] parking_safety_cache::CacheError),

    /// No API key is configured.
    #[error("Geocoding service unavailable: no API key configured")]
    Unavailable,
}

/// A provider that resolves one address at a time.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Whether the provider is configured to make requests.
    fn is_available(&self) -> bool;

    /// Resolves `address`. `Ok(None)` means the provider found nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails or the provider is
    /// unavailable.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError>;
}
