//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initializes logging
//! - parses CLI arguments into resolved configs
//! - runs the selected tool pipeline
//! - prints its summary

use std::path::{Path, PathBuf};

use clap::Parser;
use env_logger::Env;

use crate::cli::{Command, ColumnArgs, DrmArgs, GtiImportArgs, PartitionArgs, SelectArgs, SimulateArgs};
use crate::domain::{
    DrmConfig, EventColumns, GtiImportConfig, MissionEpoch, PartitionConfig, SelectConfig, SimulateConfig, SkyDir,
    StaticPsfCut,
};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `evr` binary.
pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Select(args) => handle_select(&args),
        Command::Drm(args) => handle_drm(&args),
        Command::Partition(args) => handle_partition(&args),
        Command::GtiImport(args) => handle_gti_import(&args),
        Command::Simulate(args) => handle_simulate(&args),
    }
}

fn handle_select(args: &SelectArgs) -> Result<(), AppError> {
    let config = select_config_from_args(args)?;
    let output = pipeline::run_select(&config)?;
    println!("{}", crate::report::format_select_summary(&output, &config));
    Ok(())
}

fn handle_drm(args: &DrmArgs) -> Result<(), AppError> {
    let config = drm_config_from_args(args);
    let output = pipeline::run_drm(&config)?;
    println!("{}", crate::report::format_drm_summary(&output, &config));
    Ok(())
}

fn handle_partition(args: &PartitionArgs) -> Result<(), AppError> {
    let config = partition_config_from_args(args);
    let chunks = pipeline::run_partition(&config)?;
    println!("{}", crate::report::format_partition_summary(&chunks));
    Ok(())
}

fn handle_gti_import(args: &GtiImportArgs) -> Result<(), AppError> {
    let config = gti_import_config_from_args(args)?;
    let gti = pipeline::run_gti_import(&config)?;
    println!("{}", crate::report::format_gti_summary(&gti));
    Ok(())
}

fn handle_simulate(args: &SimulateArgs) -> Result<(), AppError> {
    let config = simulate_config_from_args(args);
    let summary = pipeline::run_simulate(&config)?;
    println!("{}", crate::report::format_simulate_summary(&summary, &config));
    Ok(())
}

pub fn columns_from_args(args: &ColumnArgs) -> EventColumns {
    EventColumns {
        time: args.time_col.clone(),
        energy: args.energy_col.clone(),
        ra: args.ra_col.clone(),
        dec: args.dec_col.clone(),
        zenith: args.zenith_col.clone(),
    }
}

pub fn select_config_from_args(args: &SelectArgs) -> Result<SelectConfig, AppError> {
    let source = match (args.ra, args.dec) {
        (Some(ra), Some(dec)) => Some(SkyDir::new(ra, dec)),
        (None, None) => None,
        _ => return Err(AppError::new(2, "Give both --ra and --dec, or neither.")),
    };
    if args.apply_psf && (source.is_none() || args.scfile.is_none()) {
        return Err(AppError::new(2, "--apply-psf needs --scfile, --ra and --dec."));
    }

    Ok(SelectConfig {
        infile: args.infile.clone(),
        outfile: args.outfile.clone(),
        gti_out: args
            .gti_out
            .clone()
            .unwrap_or_else(|| default_gti_path(&args.outfile)),
        t0: args.t0,
        dtstart: args.dtstart,
        dtstop: args.dtstop,
        zmax: args.zmax,
        apply_psf: args.apply_psf,
        scfile: args.scfile.clone(),
        source,
        columns: columns_from_args(&args.columns),
        coverage: args.on_coverage,
        separation: args.separation,
    })
}

pub fn drm_config_from_args(args: &DrmArgs) -> DrmConfig {
    let psf = match (args.ra, args.dec, args.theta) {
        (Some(ra), Some(dec), Some(theta)) => Some(StaticPsfCut {
            source: SkyDir::new(ra, dec),
            off_axis_deg: theta,
        }),
        _ => None,
    };

    DrmConfig {
        manifest: args.manifest.clone(),
        outfile: args.outfile.clone(),
        emin: args.emin,
        emax: args.emax,
        enumbins: args.enumbins,
        meas_emin: args.meas_emin,
        meas_emax: args.meas_emax,
        meas_bins: args.meas_bins,
        spectral_index: args.index,
        effective_area: args.area,
        ngen: args.ngen,
        tmin: args.tmin,
        tmax: args.tmax,
        zmax: args.zmax,
        psf,
        true_energy_col: args.true_energy_col.clone(),
        columns: columns_from_args(&args.columns),
        separation: args.separation,
    }
}

pub fn partition_config_from_args(args: &PartitionArgs) -> PartitionConfig {
    PartitionConfig {
        infile: args.infile.clone(),
        gti: args.gti.clone(),
        prefix: args.prefix.clone(),
        rows_per_file: args.rows,
        time_col: args.time_col.clone(),
    }
}

pub fn gti_import_config_from_args(args: &GtiImportArgs) -> Result<GtiImportConfig, AppError> {
    let epoch = match args.mjdref {
        Some(mjdref) if mjdref.is_finite() => MissionEpoch::new(mjdref),
        Some(_) => return Err(AppError::new(2, "--mjdref must be finite.")),
        None => MissionEpoch::from_env()?,
    };
    log::debug!("using mission epoch mjdref={}", epoch.mjdref);

    Ok(GtiImportConfig {
        infile: args.infile.clone(),
        outfile: args.outfile.clone(),
        epoch,
        tmin: args.tmin,
        tmax: args.tmax,
    })
}

pub fn simulate_config_from_args(args: &SimulateArgs) -> SimulateConfig {
    SimulateConfig {
        outfile: args.outfile.clone(),
        count: args.count,
        seed: args.seed,
        spectral_index: args.index,
        emin: args.emin,
        emax: args.emax,
        resolution: args.resolution,
        tstart: args.tstart,
        tstop: args.tstop,
        source: SkyDir::new(args.ra, args.dec),
        off_axis_deg: args.theta,
        columns: columns_from_args(&args.columns),
        true_energy_col: args.true_energy_col.clone(),
    }
}

/// `events.csv` -> `events_gti.json` next to it.
fn default_gti_path(outfile: &Path) -> PathBuf {
    let stem = outfile
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "events".to_string());
    outfile.with_file_name(format!("{stem}_gti.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn select_args_resolve_to_config() {
        let cli = Cli::parse_from([
            "evr", "select", "--infile", "in.csv", "--outfile", "out/sel.csv", "--t0", "1000", "--dtstart", "-5",
            "--dtstop", "20", "--zmax", "100",
        ]);
        let Command::Select(args) = cli.command else {
            panic!("expected select");
        };
        let config = select_config_from_args(&args).unwrap();
        assert_eq!(config.time_window(), (995.0, 1020.0));
        assert_eq!(config.gti_out, PathBuf::from("out/sel_gti.json"));
        assert_eq!(config.columns, EventColumns::default());
        assert!(!config.apply_psf);
    }

    #[test]
    fn psf_without_pointing_is_rejected() {
        let cli = Cli::parse_from([
            "evr", "select", "--infile", "in.csv", "--outfile", "o.csv", "--t0", "0", "--dtstart", "0", "--dtstop",
            "1", "--apply-psf", "--ra", "10", "--dec", "-20",
        ]);
        let Command::Select(args) = cli.command else {
            panic!("expected select");
        };
        assert_eq!(select_config_from_args(&args).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn drm_static_psf_needs_all_three_angles() {
        let cli = Cli::parse_from([
            "evr", "drm", "--manifest", "m.txt", "--outfile", "r.json", "--index", "-2", "--ra", "83.6", "--dec",
            "22.0", "--theta", "30",
        ]);
        let Command::Drm(args) = cli.command else {
            panic!("expected drm");
        };
        let config = drm_config_from_args(&args);
        assert_eq!(config.spectral_index, -2.0);
        let psf = config.psf.unwrap();
        assert_eq!(psf.off_axis_deg, 30.0);

        let err = Cli::try_parse_from(["evr", "drm", "--manifest", "m", "--outfile", "r", "--ra", "1"]);
        assert!(err.is_err());
    }

    #[test]
    fn explicit_mjdref_wins() {
        let cli = Cli::parse_from([
            "evr", "gti-import", "--infile", "g.txt", "--outfile", "g.json", "--mjdref", "48361",
        ]);
        let Command::GtiImport(args) = cli.command else {
            panic!("expected gti-import");
        };
        let config = gti_import_config_from_args(&args).unwrap();
        assert_eq!(config.epoch, MissionEpoch::new(48361.0));
    }
}
