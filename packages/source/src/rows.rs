//! Mapping from CSV rows to typed parking records.
//!
//! Column names follow the City of Waterloo open-data exports, with a few
//! alternates seen in older exports. Missing columns produce empty strings
//! or defaults, never errors.

use parking_safety_parking_models::{InfractionRecord, ParkingLotRecord, StreetParkingRecord};

use crate::csv_file::CsvRow;
use crate::parsing::{parse_amount, parse_count, parse_flag};

/// Builds an infraction from a bylaw infractions row.
#[must_use]
pub fn infraction_from_row(row: &CsvRow) -> InfractionRecord {
    InfractionRecord {
        date: row.first_of(&["ISSUEDATE", "DATE", "Date"]).to_string(),
        reason: row
            .first_of(&["REASON", "INFRACTION_TYPE", "Infraction_Type"])
            .to_string(),
        fine: parse_amount(row.first_of(&["VIOFINE", "FINE"])),
        address: row
            .first_of(&["ADDRESS", "Address", "LOCATION", "Location"])
            .to_string(),
        street: row.first_of(&["STREET", "Street", "Street_Name"]).to_string(),
    }
}

/// Builds a street parking segment from an on-street parking row.
#[must_use]
pub fn street_parking_from_row(row: &CsvRow) -> StreetParkingRecord {
    StreetParkingRecord {
        category: row.get("CATEGORY").to_string(),
        subcategory: row.get("SUBCATEGORY").to_string(),
        num_spaces: parse_count(row.get("NUM_SPACES")).unwrap_or(0),
        parking_cost: row.get("PARKING_COST").to_string(),
        max_rate: row.get("MAX_RATE").to_string(),
        hours: row.get("HOURS").to_string(),
        days: row.get("DAYS").to_string(),
        payment_method: row.get("PAYMENT_METHOD").to_string(),
        ownership: row.get("OWNERSHIP").to_string(),
        street: row
            .first_of(&["STREET", "Location", "Street_Name"])
            .to_string(),
    }
}

/// Builds a parking lot from a parking lots row.
#[must_use]
pub fn parking_lot_from_row(row: &CsvRow) -> ParkingLotRecord {
    ParkingLotRecord {
        name: row.first_of(&["Lot Name", "Name"]).to_string(),
        address: row.first_of(&["Address", "ADDRESS"]).to_string(),
        owner: row.first_of(&["OWNER", "Owner"]).to_string(),
        lot_type: row.first_of(&["Lot Type", "Type"]).to_string(),
        accessible: parse_flag(row.first_of(&["Accessible", "Accessibility"])),
        capacity: parse_count(row.get("Capacity")),
        free_two_hour: parse_flag(row.get("2HR Free Lot")),
        surface: row.get("Surface").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infraction_row() {
        let row = CsvRow::from_pairs([
            ("ISSUEDATE", "9/6/2018 12:00:00 AM"),
            ("REASON", "NO PARKING"),
            ("VIOFINE", "40.00"),
            ("ADDRESS", "100 KING ST N"),
            ("STREET", "KING ST N"),
        ]);
        let record = infraction_from_row(&row);
        assert_eq!(record.date, "9/6/2018 12:00:00 AM");
        assert_eq!(record.fine, Some(40.0));
        assert_eq!(record.street, "KING ST N");
    }

    #[test]
    fn infraction_row_without_fine_column() {
        let row = CsvRow::from_pairs([("STREET", "KING ST N")]);
        let record = infraction_from_row(&row);
        assert_eq!(record.fine, None);
        assert_eq!(record.reason, "");
    }

    #[test]
    fn street_parking_row_with_float_spaces() {
        let row = CsvRow::from_pairs([
            ("STREET", "ERB ST W"),
            ("NUM_SPACES", "12.0"),
            ("PARKING_COST", "$2.00/HR"),
        ]);
        let record = street_parking_from_row(&row);
        assert_eq!(record.num_spaces, 12);
        assert_eq!(record.parking_cost, "$2.00/HR");
    }

    #[test]
    fn street_parking_row_with_nan_spaces() {
        let row = CsvRow::from_pairs([("STREET", "ERB ST W"), ("NUM_SPACES", "nan")]);
        assert_eq!(street_parking_from_row(&row).num_spaces, 0);
    }

    #[test]
    fn parking_lot_row() {
        let row = CsvRow::from_pairs([
            ("Lot Name", "Lot 4"),
            ("Address", "100 REGINA ST S"),
            ("Accessible", "Y"),
            ("Capacity", "120"),
            ("2HR Free Lot", "N"),
        ]);
        let record = parking_lot_from_row(&row);
        assert_eq!(record.name, "Lot 4");
        assert!(record.accessible);
        assert!(!record.free_two_hour);
        assert_eq!(record.capacity, Some(120));
    }
}
