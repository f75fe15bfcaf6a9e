//! Sequential tabular sources.
//!
//! Event lists and pointing histories are read strictly forward, one row at a
//! time, through the [`TableSource`] trait. The CSV implementation is the only
//! concrete backend; column lookups are case-insensitive and ignore a UTF-8 BOM
//! on the first header.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::cursor::PointingTable;
use crate::domain::PointingRecord;
use crate::error::AppError;

/// Forward-only table cursor with typed column accessors.
pub trait TableSource {
    /// Column names as they appear in the source.
    fn columns(&self) -> &[String];

    fn has_column(&self, name: &str) -> bool;

    /// Move to the next row. Returns `Ok(false)` once the table is exhausted.
    fn next_row(&mut self) -> Result<bool, AppError>;

    /// 1-based index of the current row.
    fn row_number(&self) -> usize;

    fn get_str(&self, name: &str) -> Result<&str, AppError>;

    /// The current row as read, for copying through to an output table.
    fn raw_row(&self) -> &StringRecord;

    fn get_f64(&self, name: &str) -> Result<f64, AppError> {
        let raw = self.get_str(name)?;
        raw.trim().parse::<f64>().map_err(|_| {
            AppError::new(
                2,
                format!("Row {}: column `{name}` is not a number ('{raw}').", self.row_number()),
            )
        })
    }

    fn get_i64(&self, name: &str) -> Result<i64, AppError> {
        let raw = self.get_str(name)?;
        raw.trim().parse::<i64>().map_err(|_| {
            AppError::new(
                2,
                format!("Row {}: column `{name}` is not an integer ('{raw}').", self.row_number()),
            )
        })
    }

    fn get_bool(&self, name: &str) -> Result<bool, AppError> {
        let raw = self.get_str(name)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" | "y" | "yes" => Ok(true),
            "0" | "f" | "false" | "n" | "no" => Ok(false),
            _ => Err(AppError::new(
                2,
                format!("Row {}: column `{name}` is not a boolean ('{raw}').", self.row_number()),
            )),
        }
    }
}

/// A CSV file (or any reader) exposed as a [`TableSource`].
pub struct CsvTable<R: Read> {
    label: String,
    reader: csv::Reader<R>,
    columns: Vec<String>,
    header_map: HashMap<String, usize>,
    record: StringRecord,
    row_number: usize,
}

impl CsvTable<File> {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open table '{}': {e}", path.display())))?;
        Self::from_reader(file, path.display().to_string())
    }
}

impl<R: Read> CsvTable<R> {
    pub fn from_reader(reader: R, label: impl Into<String>) -> Result<Self, AppError> {
        let label = label.into();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| AppError::new(2, format!("Failed to read headers of '{label}': {e}")))?
            .clone();
        let columns = headers.iter().map(|h| h.trim_start_matches('\u{feff}').to_string()).collect();
        let header_map = build_header_map(&headers);

        Ok(Self {
            label,
            reader,
            columns,
            header_map,
            record: StringRecord::new(),
            row_number: 0,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Fail early if any of `names` is missing.
    pub fn require_columns(&self, names: &[&str]) -> Result<(), AppError> {
        let missing: Vec<&str> = names.iter().copied().filter(|n| !self.has_column(n)).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::new(
                2,
                format!("Table '{}' is missing required column(s): {}", self.label, missing.join(", ")),
            ))
        }
    }
}

impl<R: Read> TableSource for CsvTable<R> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn has_column(&self, name: &str) -> bool {
        self.header_map.contains_key(&normalize_header_name(name))
    }

    fn next_row(&mut self) -> Result<bool, AppError> {
        let more = self.reader.read_record(&mut self.record).map_err(|e| {
            AppError::new(
                2,
                format!("Failed to read row {} of '{}': {e}", self.row_number + 1, self.label),
            )
        })?;
        if more {
            self.row_number += 1;
        }
        Ok(more)
    }

    fn row_number(&self) -> usize {
        self.row_number
    }

    fn raw_row(&self) -> &StringRecord {
        &self.record
    }

    fn get_str(&self, name: &str) -> Result<&str, AppError> {
        let idx = self
            .header_map
            .get(&normalize_header_name(name))
            .copied()
            .ok_or_else(|| AppError::new(2, format!("Table '{}' has no column `{name}`.", self.label)))?;
        self.record.get(idx).ok_or_else(|| {
            AppError::new(
                2,
                format!("Row {} of '{}' has no value for `{name}`.", self.row_number, self.label),
            )
        })
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Pointing history column names.
pub const POINTING_COLUMNS: [&str; 4] = ["START", "STOP", "RA_SCZ", "DEC_SCZ"];

/// Read every row of a pointing source into a validated [`PointingTable`].
pub fn load_pointing_table<T: TableSource>(source: &mut T) -> Result<PointingTable, AppError> {
    for name in POINTING_COLUMNS {
        if !source.has_column(name) {
            return Err(AppError::new(2, format!("Pointing table is missing column `{name}`.")));
        }
    }

    let mut records = Vec::new();
    while source.next_row()? {
        records.push(PointingRecord::new(
            source.get_f64("START")?,
            source.get_f64("STOP")?,
            source.get_f64("RA_SCZ")?,
            source.get_f64("DEC_SCZ")?,
        ));
    }
    log::debug!("loaded {} pointing records", records.len());
    Ok(PointingTable::new(records)?)
}

pub fn load_pointing_file(path: &Path) -> Result<PointingTable, AppError> {
    let mut table = CsvTable::open(path)?;
    load_pointing_table(&mut table)
}
