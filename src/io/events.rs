//! Accepted-event CSV sink.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::error::AppError;

/// Writes rows with a fixed header; rows are copied through unchanged.
pub struct EventCsvWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl EventCsvWriter {
    pub fn create<S: AsRef<str>>(path: &Path, headers: &[S]) -> Result<Self, AppError> {
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;
        writer
            .write_record(headers.iter().map(|h| h.as_ref()))
            .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    pub fn write_row(&mut self, row: &StringRecord) -> Result<(), AppError> {
        self.writer
            .write_record(row)
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row to '{}': {e}", self.path.display())))?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and close; returns the number of rows written.
    pub fn finish(mut self) -> Result<usize, AppError> {
        self.writer
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to flush CSV '{}': {e}", self.path.display())))?;
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{CsvTable, TableSource};

    #[test]
    fn rows_are_copied_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut writer = EventCsvWriter::create(&path, &["EvtElapsedTime", "EvtEnergyCorr"]).unwrap();
        writer.write_row(&StringRecord::from(vec!["1.5", "100.25"])).unwrap();
        writer.write_row(&StringRecord::from(vec!["2.0", "3e2"])).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let mut table = CsvTable::open(&path).unwrap();
        assert_eq!(table.columns(), ["EvtElapsedTime", "EvtEnergyCorr"]);
        assert!(table.next_row().unwrap());
        assert_eq!(table.get_str("EvtEnergyCorr").unwrap(), "100.25");
        assert!(table.next_row().unwrap());
        assert_eq!(table.get_f64("EvtEnergyCorr").unwrap(), 300.0);
        assert!(!table.next_row().unwrap());
    }
}
