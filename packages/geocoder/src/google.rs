//! Google Geocoding API client.
//!
//! Free-form queries go to `GET {base_url}?address=...&key=...`. The key is
//! read from the environment variable named in `services/google.toml`;
//! without it the geocoder reports itself unavailable and every lookup
//! fails with [`GeocodeError::Unavailable`].
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use parking_safety_parking_models::Coordinates;

use crate::address::{build_query, clean_address};
use crate::service_registry::{GeocodingService, google_service};
use crate::{GeocodeError, Geocoder};

/// Geocoder backed by the Google Geocoding API.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    region: String,
}

impl GoogleGeocoder {
    /// Creates a geocoder for `service` using `api_key`.
    #[must_use]
    pub fn new(api_key: Option<String>, service: &GeocodingService) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: service.base_url().to_string(),
            region: service.default_region.clone(),
        }
    }

    /// Creates a geocoder from the embedded Google service configuration
    /// and the API key in its environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        let service = google_service();
        let api_key = std::env::var(&service.api_key_env).ok();
        if api_key.is_none() {
            log::warn!(
                "{} not set. Geocoding will not work.",
                service.api_key_env
            );
        }
        Self::new(api_key, &service)
    }
}

#[async_trait::async_trait]
impl Geocoder for GoogleGeocoder {
    fn name(&self) -> &'static str {
        "google"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let Some(api_key) = &self.api_key else {
            return Err(GeocodeError::Unavailable);
        };

        let Some(cleaned) = clean_address(address) else {
            log::debug!("Skipping non-geocodable address {address:?}");
            return Ok(None);
        };
        let query = build_query(&cleaned, &self.region);

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("address", query.as_str()), ("key", api_key.as_str())])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.json().await?;
        let result = parse_response(&body)?;

        if result.is_none() {
            log::debug!("Could not geocode address: {query}");
        }

        Ok(result)
    }
}

/// Parses a Geocoding API JSON response.
///
/// `OK` yields the first result's location, `ZERO_RESULTS` yields `None`
/// and every other status is an error.
fn parse_response(body: &serde_json::Value) -> Result<Option<Coordinates>, GeocodeError> {
    let status = body["status"].as_str().ok_or_else(|| GeocodeError::Parse {
        message: "Missing status in Google response".to_string(),
    })?;

    match status {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(None),
        "OVER_QUERY_LIMIT" => return Err(GeocodeError::RateLimited),
        other => {
            return Err(GeocodeError::Api {
                status: other.to_string(),
                message: body["error_message"].as_str().unwrap_or_default().to_string(),
            });
        }
    }

    let Some(first) = body["results"].as_array().and_then(|r| r.first()) else {
        return Ok(None);
    };

    let location = &first["geometry"]["location"];
    let lat = location["lat"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "Missing lat in Google response".to_string(),
    })?;
    let lng = location["lng"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "Missing lng in Google response".to_string(),
    })?;

    Ok(Some(Coordinates::new(lat, lng)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_result() {
        let body = serde_json::json!({
            "status": "OK",
            "results": [
                {"geometry": {"location": {"lat": 43.4668, "lng": -80.5224}}},
                {"geometry": {"location": {"lat": 0.0, "lng": 0.0}}}
            ]
        });
        let coords = parse_response(&body).unwrap().unwrap();
        assert!((coords.lat - 43.4668).abs() < 1e-9);
        assert!((coords.lng - -80.5224).abs() < 1e-9);
    }

    #[test]
    fn zero_results_is_none() {
        let body = serde_json::json!({"status": "ZERO_RESULTS", "results": []});
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn over_query_limit_is_rate_limited() {
        let body = serde_json::json!({"status": "OVER_QUERY_LIMIT"});
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::RateLimited)
        ));
    }

    #[test]
    fn denied_request_is_api_error() {
        let body = serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        });
        match parse_response(&body) {
            Err(GeocodeError::Api { status, message }) => {
                assert_eq!(status, "REQUEST_DENIED");
                assert!(message.contains("invalid"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_location_is_parse_error() {
        let body = serde_json::json!({"status": "OK", "results": [{"geometry": {}}]});
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn blank_key_is_unavailable() {
        let geocoder = GoogleGeocoder::new(Some("  ".to_string()), &google_service());
        assert!(!geocoder.is_available());
    }

    #[tokio::test]
    async fn unavailable_geocoder_refuses_lookups() {
        let geocoder = GoogleGeocoder::new(None, &google_service());
        assert!(matches!(
            geocoder.geocode("KING ST N").await,
            Err(GeocodeError::Unavailable)
        ));
    }
}
