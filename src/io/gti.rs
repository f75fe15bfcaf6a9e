//! Read/write GTI JSON files.
//!
//! The document mirrors a GTI extension: a `START`/`STOP` column pair plus the
//! `TSTART`/`TSTOP`/`ONTIME` header keywords. Reading rebuilds the set through
//! [`IntervalSet::insert_interval`], so a round trip reproduces `accept` exactly.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::gti::IntervalSet;

pub const GTI_EXTNAME: &str = "GTI";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GtiFile {
    pub extname: String,
    /// Lower bound of the set; absent when the set is empty.
    pub tstart: Option<f64>,
    /// Upper bound of the set; absent when the set is empty.
    pub tstop: Option<f64>,
    pub ontime: f64,
    pub start: Vec<f64>,
    pub stop: Vec<f64>,
}

impl GtiFile {
    pub fn from_set(set: &IntervalSet) -> Self {
        Self {
            extname: GTI_EXTNAME.to_string(),
            tstart: set.min_value().ok(),
            tstop: set.max_value().ok(),
            ontime: set.ontime(),
            start: set.intervals().iter().map(|iv| iv.start).collect(),
            stop: set.intervals().iter().map(|iv| iv.stop).collect(),
        }
    }

    pub fn to_set(&self) -> Result<IntervalSet, AppError> {
        if self.start.len() != self.stop.len() {
            return Err(AppError::new(
                2,
                format!(
                    "GTI has {} START values but {} STOP values.",
                    self.start.len(),
                    self.stop.len()
                ),
            ));
        }
        let mut set = IntervalSet::new();
        for (&start, &stop) in self.start.iter().zip(&self.stop) {
            set.insert_interval(start, stop)?;
        }
        Ok(set)
    }
}

/// Write a GTI JSON file.
pub fn write_gti_json(path: &Path, set: &IntervalSet) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create GTI JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &GtiFile::from_set(set))
        .map_err(|e| AppError::new(2, format!("Failed to write GTI JSON: {e}")))?;
    Ok(())
}

/// Read a GTI JSON file back into an [`IntervalSet`].
pub fn read_gti_json(path: &Path) -> Result<IntervalSet, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open GTI JSON '{}': {e}", path.display())))?;
    let doc: GtiFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid GTI JSON '{}': {e}", path.display())))?;
    if doc.extname != GTI_EXTNAME {
        log::warn!("GTI JSON '{}' has extname '{}'", path.display(), doc.extname);
    }
    doc.to_set()
}
