#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parking dataset record types shared across the parking-safety system.
//!
//! The three municipal datasets (bylaw infractions, on-street parking rules
//! and parking lot inventory) are loaded into the typed records defined
//! here. Columns that may be absent in a given export are modelled as
//! empty strings or `Option`s rather than failures.

pub mod location;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use location::{LocationKey, strip_street_number};

/// The source dataset a record was loaded from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dataset {
    /// Bylaw parking infraction tickets.
    BylawInfractions,
    /// On-street parking segments and their rules.
    ParkingOnStreet,
    /// Municipal and private parking lots.
    ParkingLots,
}

impl Dataset {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::BylawInfractions,
            Self::ParkingOnStreet,
            Self::ParkingLots,
        ]
    }
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A single bylaw parking ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfractionRecord {
    /// Raw issue date as exported (e.g. `"9/6/2018 12:00:00 AM"`).
    pub date: String,
    /// Free-text violation category.
    pub reason: String,
    /// Fine amount, when the column is present and numeric.
    pub fine: Option<f64>,
    /// Full street address of the ticket.
    pub address: String,
    /// Street name the ticket was issued on.
    pub street: String,
}

/// One on-street parking segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreetParkingRecord {
    /// Parking category (e.g. `"ON STREET"`).
    pub category: String,
    /// Parking subcategory (e.g. `"METERED"`).
    pub subcategory: String,
    /// Number of marked spaces on the segment.
    pub num_spaces: u32,
    /// Cost text; may say `FREE` or encode a rate like `$2.00/HR`.
    pub parking_cost: String,
    /// Maximum rate text, if published.
    pub max_rate: String,
    /// Hours the rule applies (e.g. `"2HR 8AM-6PM"`).
    pub hours: String,
    /// Days the rule applies.
    pub days: String,
    /// Accepted payment methods.
    pub payment_method: String,
    /// Owner of the segment (city, region, private).
    pub ownership: String,
    /// Street name the segment is on.
    pub street: String,
}

/// One parking lot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingLotRecord {
    /// Lot name.
    pub name: String,
    /// Street address of the lot.
    pub address: String,
    /// Lot owner.
    pub owner: String,
    /// Lot type (e.g. `"PUBLIC"`).
    pub lot_type: String,
    /// Whether the lot has accessible spaces.
    pub accessible: bool,
    /// Total capacity, when known.
    pub capacity: Option<u32>,
    /// Whether the lot offers two hours of free parking.
    pub free_two_hour: bool,
    /// Surface type (e.g. `"ASPHALT"`).
    pub surface: String,
}

/// A record from any of the three datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataset", rename_all = "snake_case")]
pub enum ParkingRecord {
    /// A bylaw infraction.
    BylawInfractions(InfractionRecord),
    /// An on-street parking segment.
    ParkingOnStreet(StreetParkingRecord),
    /// A parking lot.
    ParkingLots(ParkingLotRecord),
}

impl ParkingRecord {
    /// Returns the dataset this record belongs to.
    #[must_use]
    pub const fn dataset(&self) -> Dataset {
        match self {
            Self::BylawInfractions(_) => Dataset::BylawInfractions,
            Self::ParkingOnStreet(_) => Dataset::ParkingOnStreet,
            Self::ParkingLots(_) => Dataset::ParkingLots,
        }
    }

    /// Returns the address string used when geocoding this record.
    ///
    /// Fields are tried in priority order per dataset and the first
    /// non-blank value wins.
    #[must_use]
    pub fn geocode_address(&self) -> Option<&str> {
        let candidates: [&str; 2] = match self {
            Self::BylawInfractions(r) => [r.street.as_str(), r.address.as_str()],
            Self::ParkingOnStreet(r) => [r.street.as_str(), ""],
            Self::ParkingLots(r) => [r.address.as_str(), r.name.as_str()],
        };

        candidates
            .into_iter()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    /// Returns a short human-readable title for map display.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::BylawInfractions(r) => {
                if r.street.trim().is_empty() {
                    "Unknown Location".to_string()
                } else {
                    r.street.trim().to_string()
                }
            }
            Self::ParkingOnStreet(r) => {
                if r.street.trim().is_empty() {
                    format!("{} Parking", r.category.trim()).trim().to_string()
                } else {
                    r.street.trim().to_string()
                }
            }
            Self::ParkingLots(r) => {
                if r.name.trim().is_empty() {
                    "Parking Lot".to_string()
                } else {
                    r.name.trim().to_string()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infraction_geocode_address_prefers_street() {
        let record = ParkingRecord::BylawInfractions(InfractionRecord {
            street: "KING ST N".to_string(),
            address: "100 KING ST N".to_string(),
            ..InfractionRecord::default()
        });
        assert_eq!(record.geocode_address(), Some("KING ST N"));
    }

    #[test]
    fn lot_geocode_address_falls_back_to_name() {
        let record = ParkingRecord::ParkingLots(ParkingLotRecord {
            name: "Lot 7".to_string(),
            address: "   ".to_string(),
            ..ParkingLotRecord::default()
        });
        assert_eq!(record.geocode_address(), Some("Lot 7"));
    }

    #[test]
    fn blank_street_parking_has_no_geocode_address() {
        let record = ParkingRecord::ParkingOnStreet(StreetParkingRecord::default());
        assert_eq!(record.geocode_address(), None);
        assert_eq!(record.title(), "Parking");
    }

    #[test]
    fn dataset_names_are_snake_case() {
        assert_eq!(Dataset::BylawInfractions.to_string(), "bylaw_infractions");
        assert_eq!(
            "parking_lots".parse::<Dataset>().unwrap(),
            Dataset::ParkingLots
        );
    }
}
