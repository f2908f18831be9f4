//! Header-addressed CSV reading for the municipal parking exports.
//!
//! Each file is read wholesale into [`CsvRow`]s keyed by trimmed header
//! name. Cells that are blank or hold a `nan`/`None` placeholder are
//! normalized to the empty string so downstream parsers see one shape.

use std::collections::BTreeMap;
use std::path::Path;

use crate::SourceError;
use crate::parsing::is_blank;

/// One CSV row, addressable by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    fields: BTreeMap<String, String>,
}

impl CsvRow {
    /// Builds a row from header/value pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.trim().to_string(), normalize_cell(v)))
            .collect();
        Self { fields }
    }

    /// Returns the value for `header`, or `""` when the column is absent.
    #[must_use]
    pub fn get(&self, header: &str) -> &str {
        self.fields.get(header).map_or("", String::as_str)
    }

    /// Returns the first non-empty value among `headers`.
    #[must_use]
    pub fn first_of(&self, headers: &[&str]) -> &str {
        headers
            .iter()
            .map(|h| self.get(h))
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }
}

fn normalize_cell(raw: &str) -> String {
    if is_blank(raw) {
        String::new()
    } else {
        raw.trim().to_string()
    }
}

/// The parsed contents of one CSV file.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    /// Column names in file order.
    pub columns: Vec<String>,
    /// Data rows.
    pub rows: Vec<CsvRow>,
}

/// Reads a CSV file from disk.
///
/// A missing file yields an empty table and a warning. Rows that fail to
/// parse are skipped with a warning.
///
/// # Errors
///
/// Returns [`SourceError`] if the file exists but cannot be opened or its
/// header row cannot be read.
pub fn read_csv_file(path: &Path) -> Result<CsvTable, SourceError> {
    if !path.exists() {
        log::warn!("{} not found, treating as empty", path.display());
        return Ok(CsvTable::default());
    }

    let file = std::fs::File::open(path)?;
    read_csv(file, &path.display().to_string())
}

/// Reads CSV data from any reader. `label` is used in log messages.
///
/// # Errors
///
/// Returns [`SourceError`] if the header row cannot be read.
pub fn read_csv<R: std::io::Read>(reader: R, label: &str) -> Result<CsvTable, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0_usize;

    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                skipped += 1;
                log::warn!("[{label}] skipping malformed row {}: {e}", line + 2);
                continue;
            }
        };

        let row = CsvRow::from_pairs(
            columns
                .iter()
                .enumerate()
                .map(|(i, header)| (header.as_str(), record.get(i).unwrap_or(""))),
        );
        rows.push(row);
    }

    if skipped > 0 {
        log::warn!("[{label}] skipped {skipped} malformed rows");
    }
    log::debug!("[{label}] parsed {} rows, {} columns", rows.len(), columns.len());

    Ok(CsvTable { columns, rows })
}
