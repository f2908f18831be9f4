//! Record filtering over loaded datasets.
//!
//! Each criterion applies only to the datasets that carry the relevant
//! fields; criteria that do not apply to a dataset leave it untouched.

use chrono::NaiveDate;
use parking_safety_parking_models::{InfractionRecord, ParkingLotRecord, StreetParkingRecord};
use serde::{Deserialize, Serialize};

use crate::Datasets;
use crate::parsing::parse_issue_timestamp;

/// Optional filter criteria. Text criteria are case-insensitive substring
/// matches; the date range is inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    /// Street, address or lot name fragment.
    pub location: Option<String>,
    /// Infraction reason fragment.
    pub infraction_type: Option<String>,
    /// Earliest issue date (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Latest issue date (inclusive).
    pub end_date: Option<NaiveDate>,
    /// Street parking category, subcategory or cost fragment.
    pub parking_type: Option<String>,
    /// Street parking ownership fragment.
    pub ownership: Option<String>,
    /// Street parking payment method fragment.
    pub payment_method: Option<String>,
    /// Parking lot type fragment.
    pub lot_type: Option<String>,
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn criterion(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl RecordFilter {
    /// Returns `true` if no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Tests one infraction against the location, type and date criteria.
    #[must_use]
    pub fn matches_infraction(&self, record: &InfractionRecord) -> bool {
        if let Some(location) = criterion(self.location.as_ref())
            && !contains(&record.street, location)
            && !contains(&record.address, location)
        {
            return false;
        }

        if let Some(kind) = criterion(self.infraction_type.as_ref())
            && !contains(&record.reason, kind)
        {
            return false;
        }

        if self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }

        let Ok(issued) = parse_issue_timestamp(&record.date) else {
            return false;
        };

        self.start_date.is_none_or(|start| issued.date >= start)
            && self.end_date.is_none_or(|end| issued.date <= end)
    }

    /// Tests one street parking segment against the location, type,
    /// ownership and payment criteria.
    #[must_use]
    pub fn matches_street_parking(&self, record: &StreetParkingRecord) -> bool {
        if let Some(location) = criterion(self.location.as_ref())
            && !contains(&record.street, location)
        {
            return false;
        }

        if let Some(kind) = criterion(self.parking_type.as_ref())
            && !contains(&record.category, kind)
            && !contains(&record.subcategory, kind)
            && !contains(&record.parking_cost, kind)
        {
            return false;
        }

        if let Some(ownership) = criterion(self.ownership.as_ref())
            && !contains(&record.ownership, ownership)
        {
            return false;
        }

        if let Some(payment) = criterion(self.payment_method.as_ref())
            && !contains(&record.payment_method, payment)
        {
            return false;
        }

        true
    }

    /// Tests one parking lot against the location and lot type criteria.
    #[must_use]
    pub fn matches_lot(&self, record: &ParkingLotRecord) -> bool {
        if let Some(location) = criterion(self.location.as_ref())
            && !contains(&record.name, location)
            && !contains(&record.address, location)
        {
            return false;
        }

        if let Some(kind) = criterion(self.lot_type.as_ref())
            && !contains(&record.lot_type, kind)
        {
            return false;
        }

        true
    }

    /// Applies the filter to every dataset.
    #[must_use]
    pub fn apply(&self, datasets: &Datasets) -> Datasets {
        Datasets {
            infractions: datasets
                .infractions
                .iter()
                .filter(|r| self.matches_infraction(r))
                .cloned()
                .collect(),
            street_parking: datasets
                .street_parking
                .iter()
                .filter(|r| self.matches_street_parking(r))
                .cloned()
                .collect(),
            parking_lots: datasets
                .parking_lots
                .iter()
                .filter(|r| self.matches_lot(r))
                .cloned()
                .collect(),
            columns: datasets.columns.clone(),
        }
    }
}
