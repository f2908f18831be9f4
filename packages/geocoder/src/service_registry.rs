//! Compile-time registry of geocoding service configurations.
//!
//! Each provider is defined in a TOML file under `services/`. The registry
//! embeds these at compile time and exposes them via [`all_services`] and
//! [`enabled_services`].

use std::time::Duration;

use parking_safety_parking_models::Coordinates;
use serde::Deserialize;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"google"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service is active.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Region appended to every query (e.g., `"Waterloo, ON, Canada"`).
    pub default_region: String,
    /// Where records without coordinates are drawn.
    pub default_center: Coordinates,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
    /// Request pacing for batch runs.
    pub rate_limit: RateLimit,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Google Geocoding API.
    Google {
        /// Endpoint URL.
        base_url: String,
    },
}

/// Pause for `pause_ms` after every `pause_every` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimit {
    /// Requests between pauses.
    pub pause_every: usize,
    /// Pause length in milliseconds.
    pub pause_ms: u64,
}

impl RateLimit {
    /// The pause as a [`Duration`].
    #[must_use]
    pub const fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    /// Whether to pause after the `completed`-th request (1-based).
    #[must_use]
    pub const fn should_pause_after(&self, completed: usize) -> bool {
        self.pause_every > 0 && completed % self.pause_every == 0
    }
}

const fn default_true() -> bool {
    true
}

impl GeocodingService {
    /// Returns the provider's base URL regardless of variant.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Google { base_url } => base_url,
        }
    }
}

const SERVICE_TOMLS: &[(&str, &str)] = &[("google", include_str!("../services/google.toml"))];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 1;

/// Returns all geocoding service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded at
/// compile time).
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse geocoding service '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services.
#[must_use]
pub fn enabled_services() -> Vec<GeocodingService> {
    all_services().into_iter().filter(|s| s.enabled).collect()
}

/// The Google service configuration.
///
/// # Panics
///
/// Panics if the embedded `google.toml` is missing from the registry.
#[must_use]
pub fn google_service() -> GeocodingService {
    all_services()
        .into_iter()
        .find(|s| s.id == "google")
        .unwrap_or_else(|| panic!("google geocoding service is not registered"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_services() {
        assert_eq!(all_services().len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn google_config_values() {
        let google = google_service();
        assert!(google.enabled);
        assert_eq!(google.api_key_env, "GOOGLE_MAPS_API_KEY");
        assert_eq!(google.default_region, "Waterloo, ON, Canada");
        assert_eq!(google.default_center, Coordinates::new(43.4643, -80.5204));
        assert!(google.base_url().starts_with("https://maps.googleapis.com/"));
        assert_eq!(
            google.rate_limit,
            RateLimit {
                pause_every: 10,
                pause_ms: 100
            }
        );
    }

    #[test]
    fn enabled_services_include_google() {
        assert!(enabled_services().iter().any(|s| s.id == "google"));
    }

    #[test]
    fn pauses_every_nth_request() {
        let limit = RateLimit {
            pause_every: 10,
            pause_ms: 100,
        };
        assert!(!limit.should_pause_after(9));
        assert!(limit.should_pause_after(10));
        assert!(limit.should_pause_after(20));
        assert_eq!(limit.pause(), Duration::from_millis(100));
    }

    #[test]
    fn zero_cadence_never_pauses() {
        let limit = RateLimit {
            pause_every: 0,
            pause_ms: 100,
        };
        assert!(!limit.should_pause_after(10));
    }
}
