//! Shared domain types.
//!
//! These types are intentionally lightweight so they can be built from table
//! rows, passed through the cuts, and serialized into the output documents.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::epoch::MissionEpoch;

/// A direction on the sky in equatorial coordinates (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyDir {
    pub ra: f64,
    pub dec: f64,
}

impl SkyDir {
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }
}

/// One row of the spacecraft pointing history.
///
/// `[start, stop)` is in mission-elapsed seconds; `boresight` is the
/// instrument z-axis direction valid over that span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointingRecord {
    pub start: f64,
    pub stop: f64,
    pub boresight: SkyDir,
}

impl PointingRecord {
    pub fn new(start: f64, stop: f64, ra: f64, dec: f64) -> Self {
        Self {
            start,
            stop,
            boresight: SkyDir::new(ra, dec),
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.stop
    }
}

/// What to do with an event whose time is not covered by the pointing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CoveragePolicy {
    /// Abort the run on the first uncovered event.
    Strict,
    /// Skip the uncovered event and keep going.
    Lenient,
}

/// Which angular-separation formula the PSF cut uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SeparationKind {
    /// Exact great-circle distance (haversine).
    GreatCircle,
    /// Small-angle `sqrt((cos(dec)·Δra)² + Δdec²)` approximation.
    FlatSky,
}

/// Column names read from event tables.
///
/// Lookups are case-insensitive, so `EvtElapsedTime` and `evtelapsedtime`
/// are equivalent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventColumns {
    pub time: String,
    pub energy: String,
    pub ra: String,
    pub dec: String,
    pub zenith: String,
}

impl Default for EventColumns {
    fn default() -> Self {
        Self {
            time: "EvtElapsedTime".to_string(),
            energy: "EvtEnergyCorr".to_string(),
            ra: "FT1Ra".to_string(),
            dec: "FT1Dec".to_string(),
            zenith: "FT1ZenithTheta".to_string(),
        }
    }
}

/// A PSF cut evaluated at a fixed off-axis angle (no pointing history).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticPsfCut {
    pub source: SkyDir,
    pub off_axis_deg: f64,
}

/// Resolved configuration for `evr select`.
#[derive(Debug, Clone)]
pub struct SelectConfig {
    pub infile: PathBuf,
    pub outfile: PathBuf,
    pub gti_out: PathBuf,
    pub t0: f64,
    pub dtstart: f64,
    pub dtstop: f64,
    pub zmax: Option<f64>,
    pub apply_psf: bool,
    pub scfile: Option<PathBuf>,
    pub source: Option<SkyDir>,
    pub columns: EventColumns,
    pub coverage: CoveragePolicy,
    pub separation: SeparationKind,
}

impl SelectConfig {
    /// Absolute `[tmin, tmax]` selection window.
    pub fn time_window(&self) -> (f64, f64) {
        (self.t0 + self.dtstart, self.t0 + self.dtstop)
    }
}

/// Resolved configuration for `evr drm`.
#[derive(Debug, Clone)]
pub struct DrmConfig {
    pub manifest: PathBuf,
    pub outfile: PathBuf,
    pub emin: f64,
    pub emax: f64,
    pub enumbins: usize,
    pub meas_emin: f64,
    pub meas_emax: f64,
    pub meas_bins: usize,
    /// Incident flux is assumed to follow `E^spectral_index`.
    pub spectral_index: f64,
    pub effective_area: f64,
    /// Overrides the generated count summed from the manifest.
    pub ngen: Option<u64>,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
    pub zmax: Option<f64>,
    pub psf: Option<StaticPsfCut>,
    pub true_energy_col: String,
    pub columns: EventColumns,
    pub separation: SeparationKind,
}

/// Resolved configuration for `evr partition`.
#[derive(Debug, Clone)]
pub struct PartitionConfig {
    pub infile: PathBuf,
    pub gti: PathBuf,
    pub prefix: PathBuf,
    pub rows_per_file: usize,
    pub time_col: String,
}

/// Resolved configuration for `evr gti-import`.
#[derive(Debug, Clone)]
pub struct GtiImportConfig {
    pub infile: PathBuf,
    pub outfile: PathBuf,
    pub epoch: MissionEpoch,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
}

/// Resolved configuration for `evr simulate`.
#[derive(Debug, Clone)]
pub struct SimulateConfig {
    pub outfile: PathBuf,
    pub count: usize,
    pub seed: u64,
    pub spectral_index: f64,
    pub emin: f64,
    pub emax: f64,
    /// Log-normal width (natural log) of the measured/true energy ratio.
    pub resolution: f64,
    pub tstart: f64,
    pub tstop: f64,
    pub source: SkyDir,
    /// Off-axis angle used to size the simulated PSF spread.
    pub off_axis_deg: f64,
    pub columns: EventColumns,
    pub true_energy_col: String,
}
