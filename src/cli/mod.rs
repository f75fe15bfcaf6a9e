//! Command-line parsing for the event-selection and response tools.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipelines; `app` turns these structs into resolved configs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{CoveragePolicy, SeparationKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "evr", version, about = "Event selection and instrument-response tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select events by time window, zenith angle and PSF containment.
    Select(SelectArgs),
    /// Build a detector response matrix from simulated event batches.
    Drm(DrmArgs),
    /// Split an event table into files of a fixed number of rows.
    Partition(PartitionArgs),
    /// Convert a TJD good-time list to GTI JSON.
    GtiImport(GtiImportArgs),
    /// Generate a synthetic power-law Monte Carlo batch.
    Simulate(SimulateArgs),
}

/// Event-table column names.
#[derive(Debug, Args, Clone)]
pub struct ColumnArgs {
    /// Event time column (MET seconds).
    #[arg(long, default_value = "EvtElapsedTime")]
    pub time_col: String,

    /// Measured energy column (MeV).
    #[arg(long, default_value = "EvtEnergyCorr")]
    pub energy_col: String,

    /// Event right ascension column (deg).
    #[arg(long, default_value = "FT1Ra")]
    pub ra_col: String,

    /// Event declination column (deg).
    #[arg(long, default_value = "FT1Dec")]
    pub dec_col: String,

    /// Event zenith angle column (deg).
    #[arg(long, default_value = "FT1ZenithTheta")]
    pub zenith_col: String,
}

#[derive(Debug, Args, Clone)]
pub struct SelectArgs {
    /// Input event CSV, sorted by time.
    #[arg(long, value_name = "CSV")]
    pub infile: PathBuf,

    /// Output CSV of accepted events.
    #[arg(long, value_name = "CSV")]
    pub outfile: PathBuf,

    /// Output GTI JSON (defaults to `<outfile stem>_gti.json`).
    #[arg(long, value_name = "JSON")]
    pub gti_out: Option<PathBuf>,

    /// Reference time (MET seconds).
    #[arg(long)]
    pub t0: f64,

    /// Window start relative to t0 (s).
    #[arg(long, allow_hyphen_values = true)]
    pub dtstart: f64,

    /// Window stop relative to t0 (s).
    #[arg(long, allow_hyphen_values = true)]
    pub dtstop: f64,

    /// Keep events with zenith angle strictly below this value (deg).
    #[arg(long)]
    pub zmax: Option<f64>,

    /// Apply the view-angle-dependent PSF cut.
    #[arg(long)]
    pub apply_psf: bool,

    /// Pointing history CSV (START, STOP, RA_SCZ, DEC_SCZ).
    #[arg(long, value_name = "CSV")]
    pub scfile: Option<PathBuf>,

    /// Source right ascension (deg).
    #[arg(long)]
    pub ra: Option<f64>,

    /// Source declination (deg).
    #[arg(long, allow_hyphen_values = true)]
    pub dec: Option<f64>,

    /// What to do with events outside pointing coverage.
    #[arg(long, value_enum, default_value_t = CoveragePolicy::Strict)]
    pub on_coverage: CoveragePolicy,

    /// Event-to-source separation formula.
    #[arg(long, value_enum, default_value_t = SeparationKind::GreatCircle)]
    pub separation: SeparationKind,

    #[command(flatten)]
    pub columns: ColumnArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DrmArgs {
    /// Batch manifest: one `<csv path> [generated]` per line.
    #[arg(long, value_name = "FILE")]
    pub manifest: PathBuf,

    /// Output response JSON.
    #[arg(long, value_name = "JSON")]
    pub outfile: PathBuf,

    /// Lower edge of the true-energy range (MeV).
    #[arg(long, default_value_t = 10.0)]
    pub emin: f64,

    /// Upper edge of the true-energy range (MeV).
    #[arg(long, default_value_t = 1e5)]
    pub emax: f64,

    /// Number of logarithmic true-energy bins.
    #[arg(long, default_value_t = 20)]
    pub enumbins: usize,

    /// Lower edge of the measured-energy range (MeV).
    #[arg(long, default_value_t = 10.0)]
    pub meas_emin: f64,

    /// Upper edge of the measured-energy range (MeV).
    #[arg(long, default_value_t = 1e5)]
    pub meas_emax: f64,

    /// Number of measured bins (uniform in log10 energy).
    #[arg(long, default_value_t = 40)]
    pub meas_bins: usize,

    /// Spectral index of the simulated flux, `dN/dE ∝ E^index`.
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    pub index: f64,

    /// Area over which events were thrown (cm²).
    #[arg(long, default_value_t = 6e4)]
    pub area: f64,

    /// Total generated events; overrides the manifest counts.
    #[arg(long)]
    pub ngen: Option<u64>,

    /// Keep events at or after this time (MET s).
    #[arg(long, allow_hyphen_values = true)]
    pub tmin: Option<f64>,

    /// Keep events before this time (MET s).
    #[arg(long, allow_hyphen_values = true)]
    pub tmax: Option<f64>,

    /// Keep events with zenith angle strictly below this value (deg).
    #[arg(long)]
    pub zmax: Option<f64>,

    /// Source right ascension for a fixed-angle PSF cut (deg).
    #[arg(long, requires_all = ["dec", "theta"])]
    pub ra: Option<f64>,

    /// Source declination for a fixed-angle PSF cut (deg).
    #[arg(long, allow_hyphen_values = true, requires_all = ["ra", "theta"])]
    pub dec: Option<f64>,

    /// Off-axis angle of the source for the fixed-angle PSF cut (deg).
    #[arg(long, requires_all = ["ra", "dec"])]
    pub theta: Option<f64>,

    /// Monte Carlo true-energy column.
    #[arg(long, default_value = "McEnergy")]
    pub true_energy_col: String,

    /// Event-to-source separation formula.
    #[arg(long, value_enum, default_value_t = SeparationKind::GreatCircle)]
    pub separation: SeparationKind,

    #[command(flatten)]
    pub columns: ColumnArgs,
}

#[derive(Debug, Args, Clone)]
pub struct PartitionArgs {
    /// Input event CSV, sorted by time.
    #[arg(long, value_name = "CSV")]
    pub infile: PathBuf,

    /// GTI JSON of the input events.
    #[arg(long, value_name = "JSON")]
    pub gti: PathBuf,

    /// Output prefix; files are `<prefix>_NNNN.csv` and `<prefix>_NNNN_gti.json`.
    #[arg(long)]
    pub prefix: PathBuf,

    /// Rows per output file.
    #[arg(long, default_value_t = 10_000)]
    pub rows: usize,

    /// Event time column (MET seconds).
    #[arg(long, default_value = "EvtElapsedTime")]
    pub time_col: String,
}

#[derive(Debug, Args, Clone)]
pub struct GtiImportArgs {
    /// Text file of `start_tjd stop_tjd` pairs.
    #[arg(long, value_name = "FILE")]
    pub infile: PathBuf,

    /// Output GTI JSON.
    #[arg(long, value_name = "JSON")]
    pub outfile: PathBuf,

    /// MJD of MET zero (defaults to $MISSION_MJDREF, then 51910).
    #[arg(long)]
    pub mjdref: Option<f64>,

    /// Clip the imported GTI below this time (MET s).
    #[arg(long, allow_hyphen_values = true)]
    pub tmin: Option<f64>,

    /// Clip the imported GTI above this time (MET s).
    #[arg(long, allow_hyphen_values = true)]
    pub tmax: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Output event CSV.
    #[arg(long, value_name = "CSV")]
    pub outfile: PathBuf,

    /// Number of events to throw.
    #[arg(short = 'n', long, default_value_t = 10_000)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Spectral index of the thrown flux, `dN/dE ∝ E^index`.
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    pub index: f64,

    #[arg(long, default_value_t = 10.0)]
    pub emin: f64,

    #[arg(long, default_value_t = 1e5)]
    pub emax: f64,

    /// Log-normal energy dispersion width.
    #[arg(long, default_value_t = 0.15)]
    pub resolution: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub tstart: f64,

    #[arg(long, default_value_t = 1000.0, allow_hyphen_values = true)]
    pub tstop: f64,

    /// Source right ascension (deg).
    #[arg(long, default_value_t = 0.0)]
    pub ra: f64,

    /// Source declination (deg).
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub dec: f64,

    /// Source off-axis angle used to size the PSF scatter (deg).
    #[arg(long, default_value_t = 0.0)]
    pub theta: f64,

    /// Monte Carlo true-energy column.
    #[arg(long, default_value = "McEnergy")]
    pub true_energy_col: String,

    #[command(flatten)]
    pub columns: ColumnArgs,
}
