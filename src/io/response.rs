//! Read/write response-matrix JSON files.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::response::ResponseMatrix;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFile {
    pub tool: String,
    pub created: DateTime<Utc>,
    #[serde(flatten)]
    pub response: ResponseMatrix,
}

impl ResponseFile {
    pub fn new(response: ResponseMatrix) -> Self {
        Self {
            tool: "evr".to_string(),
            created: Utc::now(),
            response,
        }
    }
}

pub fn write_response_json(path: &Path, doc: &ResponseFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create response JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, doc)
        .map_err(|e| AppError::new(2, format!("Failed to write response JSON: {e}")))?;
    Ok(())
}

pub fn read_response_json(path: &Path) -> Result<ResponseFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open response JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid response JSON '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{LinearBinner, LogBinner};
    use crate::response::ResponseMatrixBuilder;

    #[test]
    fn written_response_reads_back() {
        let mut drm = ResponseMatrixBuilder::new(
            LogBinner::new(10.0, 1e4, 3).unwrap(),
            LinearBinner::new(1.0, 4.0, 3).unwrap(),
            -2.0,
            6e4,
        );
        drm.add_generated(100).unwrap();
        drm.ingest(500.0, 480.0).unwrap();
        drm.finalize().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drm.json");
        let doc = ResponseFile::new(drm.to_matrix().unwrap());
        write_response_json(&path, &doc).unwrap();

        let back = read_response_json(&path).unwrap();
        assert_eq!(back.tool, "evr");
        assert_eq!(back.response.true_binning, doc.response.true_binning);
        assert_eq!(back.response.generated, vec![100; 3]);
        let row = back.response.lookup(500.0).unwrap();
        for (got, want) in row.iter().zip(drm.lookup(500.0).unwrap()) {
            assert!((got - want).abs() <= 1e-12 * want.abs());
        }
    }
}
