#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Parking dataset loading, field parsing and record filtering.
//!
//! The three municipal exports are read from a data directory described
//! by [`DatasetPaths`] and loaded into a [`Datasets`] bundle of typed
//! records. A missing file is an empty dataset, not an error.

pub mod csv_file;
pub mod filter;
pub mod parsing;
pub mod progress;
pub mod rows;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use parking_safety_parking_models::{
    Dataset, InfractionRecord, ParkingLotRecord, ParkingRecord, StreetParkingRecord,
};

pub use filter::RecordFilter;

/// Environment variable naming the dataset directory.
pub const DATA_DIR_ENV: &str = "PARKING_SAFETY_DATA_DIR";

/// Dataset directory used when [`DATA_DIR_ENV`] is unset.
pub const DEFAULT_DATA_DIR: &str = "data/sample";

/// Errors that can occur while loading datasets.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV structure error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Locations of the three dataset files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    /// Bylaw infractions export.
    pub bylaw_infractions: PathBuf,
    /// On-street parking export.
    pub parking_on_street: PathBuf,
    /// Parking lots export.
    pub parking_lots: PathBuf,
}

impl DatasetPaths {
    /// Default file names of the City of Waterloo exports inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            bylaw_infractions: dir
                .join("City_of_Waterloo_Bylaw_Parking_Infractions_-239008864429410164.csv"),
            parking_on_street: dir.join("Parking_On_Street_-3246370995636778304.csv"),
            parking_lots: dir.join("ParkingLots_3219243981443247613.csv"),
        }
    }

    /// Resolves the data directory from `PARKING_SAFETY_DATA_DIR`, falling
    /// back to `data/sample`.
    #[must_use]
    pub fn from_env() -> Self {
        let dir = std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        Self::in_dir(Path::new(&dir))
    }

    /// Returns the path for one dataset.
    #[must_use]
    pub fn path(&self, dataset: Dataset) -> &Path {
        match dataset {
            Dataset::BylawInfractions => &self.bylaw_infractions,
            Dataset::ParkingOnStreet => &self.parking_on_street,
            Dataset::ParkingLots => &self.parking_lots,
        }
    }

    /// All tracked files in a fixed order: infractions, street parking,
    /// lots. This order feeds the cache fingerprint.
    #[must_use]
    pub fn tracked_files(&self) -> Vec<PathBuf> {
        Dataset::all()
            .iter()
            .map(|d| self.path(*d).to_path_buf())
            .collect()
    }
}

/// The three loaded datasets.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    /// Bylaw infraction tickets.
    pub infractions: Vec<InfractionRecord>,
    /// On-street parking segments.
    pub street_parking: Vec<StreetParkingRecord>,
    /// Parking lots.
    pub parking_lots: Vec<ParkingLotRecord>,
    /// Column names seen in each file.
    pub columns: BTreeMap<Dataset, Vec<String>>,
}

impl Datasets {
    /// Number of records in one dataset.
    #[must_use]
    pub fn count(&self, dataset: Dataset) -> usize {
        match dataset {
            Dataset::BylawInfractions => self.infractions.len(),
            Dataset::ParkingOnStreet => self.street_parking.len(),
            Dataset::ParkingLots => self.parking_lots.len(),
        }
    }

    /// Total number of records across all datasets.
    #[must_use]
    pub fn total_records(&self) -> usize {
        Dataset::all().iter().map(|d| self.count(*d)).sum()
    }

    /// Column names for one dataset, empty if the file was missing.
    #[must_use]
    pub fn columns(&self, dataset: Dataset) -> &[String] {
        self.columns.get(&dataset).map_or(&[], Vec::as_slice)
    }

    /// Every record as a tagged [`ParkingRecord`], infractions first.
    pub fn all_records(&self) -> impl Iterator<Item = ParkingRecord> + '_ {
        self.infractions
            .iter()
            .cloned()
            .map(ParkingRecord::BylawInfractions)
            .chain(
                self.street_parking
                    .iter()
                    .cloned()
                    .map(ParkingRecord::ParkingOnStreet),
            )
            .chain(
                self.parking_lots
                    .iter()
                    .cloned()
                    .map(ParkingRecord::ParkingLots),
            )
    }
}

/// Loads all three datasets.
///
/// # Errors
///
/// Returns [`SourceError`] if an existing file cannot be read. Missing
/// files and malformed rows are logged and skipped.
pub fn load_datasets(paths: &DatasetPaths) -> Result<Datasets, SourceError> {
    let mut datasets = Datasets::default();

    for dataset in Dataset::all() {
        let path = paths.path(*dataset);
        log::info!("Loading {dataset} from {}", path.display());
        let table = csv_file::read_csv_file(path)?;

        match dataset {
            Dataset::BylawInfractions => {
                datasets.infractions = table.rows.iter().map(rows::infraction_from_row).collect();
            }
            Dataset::ParkingOnStreet => {
                datasets.street_parking = table
                    .rows
                    .iter()
                    .map(rows::street_parking_from_row)
                    .collect();
            }
            Dataset::ParkingLots => {
                datasets.parking_lots = table.rows.iter().map(rows::parking_lot_from_row).collect();
            }
        }

        log::info!(
            "Loaded {} {dataset} records ({} columns)",
            datasets.count(*dataset),
            table.columns.len()
        );
        datasets.columns.insert(*dataset, table.columns);
    }

    log::info!("Total records loaded: {}", datasets.total_records());

    Ok(datasets)
}

/// Distinct geocodable addresses in first-seen order.
///
/// Blank addresses are skipped; see [`ParkingRecord::geocode_address`] for
/// the per-dataset field priority.
#[must_use]
pub fn unique_addresses(datasets: &Datasets) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut addresses = Vec::new();

    for record in datasets.all_records() {
        if let Some(address) = record.geocode_address()
            && seen.insert(address.to_string())
        {
            addresses.push(address.to_string());
        }
    }

    log::debug!("Extracted {} unique addresses", addresses.len());
    addresses
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, path: &Path, contents: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn loads_all_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DatasetPaths::in_dir(dir.path());
        write(
            dir.path(),
            &paths.bylaw_infractions,
            "ISSUEDATE,REASON,VIOFINE,ADDRESS,STREET\n\
             1/5/2024 9:00:00 AM,NO PARKING,40,100 KING ST N,KING ST N\n\
             1/6/2024,EXPIRED METER,nan,,ERB ST W\n",
        );
        write(
            dir.path(),
            &paths.parking_on_street,
            "STREET,NUM_SPACES,PARKING_COST\nKING ST N,10,FREE\n",
        );
        write(
            dir.path(),
            &paths.parking_lots,
            "Lot Name,Address,2HR Free Lot\nLot 4,100 REGINA ST S,Y\n",
        );

        let datasets = load_datasets(&paths).unwrap();
        assert_eq!(datasets.infractions.len(), 2);
        assert_eq!(datasets.infractions[1].fine, None);
        assert_eq!(datasets.street_parking[0].num_spaces, 10);
        assert!(datasets.parking_lots[0].free_two_hour);
        assert_eq!(datasets.total_records(), 4);
        assert_eq!(datasets.columns(Dataset::ParkingOnStreet).len(), 3);
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let datasets = load_datasets(&DatasetPaths::in_dir(dir.path())).unwrap();
        assert_eq!(datasets.total_records(), 0);
        assert!(datasets.columns(Dataset::ParkingLots).is_empty());
    }

    #[test]
    fn tracked_files_order() {
        let paths = DatasetPaths::in_dir(Path::new("data"));
        let files = paths.tracked_files();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0], paths.bylaw_infractions);
        assert_eq!(files[2], paths.parking_lots);
    }

    #[test]
    fn unique_addresses_dedupe_in_first_seen_order() {
        let datasets = Datasets {
            infractions: vec![
                InfractionRecord {
                    street: "KING ST N".to_string(),
                    ..InfractionRecord::default()
                },
                InfractionRecord {
                    street: String::new(),
                    address: "5 ERB ST W".to_string(),
                    ..InfractionRecord::default()
                },
                InfractionRecord {
                    street: "KING ST N".to_string(),
                    ..InfractionRecord::default()
                },
            ],
            street_parking: vec![StreetParkingRecord::default()],
            parking_lots: vec![ParkingLotRecord {
                name: "Lot 4".to_string(),
                ..ParkingLotRecord::default()
            }],
            ..Datasets::default()
        };

        assert_eq!(
            unique_addresses(&datasets),
            vec!["KING ST N", "5 ERB ST W", "Lot 4"]
        );
    }
}
