//! Groups records from the three datasets by location key.

use std::collections::BTreeSet;

use parking_safety_parking_models::{
    InfractionRecord, LocationKey, ParkingLotRecord, StreetParkingRecord,
};
use parking_safety_source::Datasets;

/// Records from every dataset that belong to one location.
#[derive(Debug, Clone, Default)]
pub struct LocationRecords<'a> {
    /// Infractions issued on the street.
    pub infractions: Vec<&'a InfractionRecord>,
    /// Street parking segments on the street.
    pub street_parking: Vec<&'a StreetParkingRecord>,
    /// Lots whose address matches the location.
    pub parking_lots: Vec<&'a ParkingLotRecord>,
}

/// Borrowing view over [`Datasets`] that resolves location keys.
///
/// Infractions and street parking join on exact street equality. Lots join
/// on [`LocationKey::matches_lot_address`], which also accepts addresses
/// that contain the key or equal it once the house number is removed.
pub struct LocationAggregator<'a> {
    datasets: &'a Datasets,
}

impl<'a> LocationAggregator<'a> {
    /// Creates an aggregator over loaded datasets.
    #[must_use]
    pub const fn new(datasets: &'a Datasets) -> Self {
        Self { datasets }
    }

    /// Every distinct key: infraction streets, street parking streets and
    /// lot addresses, sorted. Blank values are ignored.
    #[must_use]
    pub fn locations(&self) -> BTreeSet<LocationKey> {
        let infraction_streets = self.datasets.infractions.iter().map(|r| &r.street);
        let parking_streets = self.datasets.street_parking.iter().map(|r| &r.street);
        let lot_addresses = self.datasets.parking_lots.iter().map(|r| &r.address);

        infraction_streets
            .chain(parking_streets)
            .chain(lot_addresses)
            .filter_map(|raw| LocationKey::new(raw))
            .collect()
    }

    /// Collects the records of every dataset that match `key`.
    #[must_use]
    pub fn records_for(&self, key: &LocationKey) -> LocationRecords<'a> {
        LocationRecords {
            infractions: self
                .datasets
                .infractions
                .iter()
                .filter(|r| key.matches_street(&r.street))
                .collect(),
            street_parking: self
                .datasets
                .street_parking
                .iter()
                .filter(|r| key.matches_street(&r.street))
                .collect(),
            parking_lots: self
                .datasets
                .parking_lots
                .iter()
                .filter(|r| key.matches_lot_address(&r.address))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datasets() -> Datasets {
        Datasets {
            infractions: vec![
                InfractionRecord {
                    street: "king st n".to_string(),
                    ..InfractionRecord::default()
                },
                InfractionRecord {
                    street: "KING ST N ".to_string(),
                    ..InfractionRecord::default()
                },
                InfractionRecord {
                    street: String::new(),
                    address: "5 ERB ST".to_string(),
                    ..InfractionRecord::default()
                },
            ],
            street_parking: vec![StreetParkingRecord {
                street: "REGINA ST S".to_string(),
                ..StreetParkingRecord::default()
            }],
            parking_lots: vec![
                ParkingLotRecord {
                    name: "Lot 4".to_string(),
                    address: "100 Regina St S".to_string(),
                    ..ParkingLotRecord::default()
                },
                ParkingLotRecord {
                    name: "Lot 9".to_string(),
                    address: "20 KING ST N".to_string(),
                    ..ParkingLotRecord::default()
                },
            ],
            ..Datasets::default()
        }
    }

    #[test]
    fn locations_are_normalized_sorted_and_distinct() {
        let data = datasets();
        let keys: Vec<String> = LocationAggregator::new(&data)
            .locations()
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(
            keys,
            vec!["100 REGINA ST S", "20 KING ST N", "KING ST N", "REGINA ST S"]
        );
    }

    #[test]
    fn street_records_match_exactly() {
        let data = datasets();
        let aggregator = LocationAggregator::new(&data);
        let records = aggregator.records_for(&LocationKey::new("KING ST N").unwrap());
        assert_eq!(records.infractions.len(), 2);
        assert!(records.street_parking.is_empty());
        assert_eq!(records.parking_lots.len(), 1);
        assert_eq!(records.parking_lots[0].name, "Lot 9");
    }

    #[test]
    fn lots_match_after_stripping_house_number() {
        let data = datasets();
        let aggregator = LocationAggregator::new(&data);
        let records = aggregator.records_for(&LocationKey::new("REGINA ST S").unwrap());
        assert_eq!(records.street_parking.len(), 1);
        assert_eq!(records.parking_lots.len(), 1);
        assert_eq!(records.parking_lots[0].name, "Lot 4");
    }

    #[test]
    fn lot_address_key_does_not_match_street_records() {
        let data = datasets();
        let aggregator = LocationAggregator::new(&data);
        let records = aggregator.records_for(&LocationKey::new("100 REGINA ST S").unwrap());
        assert!(records.street_parking.is_empty());
        assert_eq!(records.parking_lots.len(), 1);
    }
}
