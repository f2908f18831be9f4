//! Prompts for the data and cache directories and the listen address,
//! then starts the server.

use dialoguer::{Confirm, Input};
use parking_safety_cache::CacheManager;
use parking_safety_geocoder::{Geocoder as _, GoogleGeocoder};

fn prompt(label: &str, env: &str, fallback: String) -> String {
    let current = std::env::var(env).unwrap_or(fallback);
    Input::new()
        .with_prompt(label)
        .default(current.clone())
        .interact_text()
        .unwrap_or(current)
}

/// Runs the server after asking for its configuration.
///
/// Answers are written to `PARKING_SAFETY_DATA_DIR`,
/// `PARKING_SAFETY_CACHE_DIR`, `BIND_ADDR` and `PORT` before delegating
/// to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Parking Safety Server");
    println!();

    let data_dir = prompt(
        "Data directory",
        "PARKING_SAFETY_DATA_DIR",
        "data/sample".to_string(),
    );
    let cache_dir = prompt(
        "Cache directory",
        "PARKING_SAFETY_CACHE_DIR",
        CacheManager::from_env().dir().display().to_string(),
    );
    let bind_addr = prompt("Bind address", "BIND_ADDR", "127.0.0.1".to_string());
    let port = prompt("Port", "PORT", super::DEFAULT_PORT.to_string());

    // SAFETY: nothing reads these concurrently; the server reads them once at startup.
    unsafe {
        std::env::set_var("PARKING_SAFETY_DATA_DIR", &data_dir);
        std::env::set_var("PARKING_SAFETY_CACHE_DIR", &cache_dir);
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port);
    }

    if !GoogleGeocoder::from_env().is_available() {
        println!("GOOGLE_MAPS_API_KEY is not set; geocoding endpoints will be unavailable.");
    }

    if !Confirm::new()
        .with_prompt(format!("Serve {data_dir} on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
