//! Tool pipelines shared by the CLI and the integration tests.
//!
//! Each `run_*` function takes a resolved config, does all file I/O, and
//! returns a summary value; printing is left to the caller.
//!
//! - `select`: event table -> time/zenith/PSF cuts -> accepted CSV + GTI JSON
//! - `drm`: manifest of MC batches -> per-batch builders (parallel) -> merged,
//!   normalized response JSON
//! - `partition`: event table -> fixed-size chunks, each with a clipped GTI
//! - `gti-import`: TJD list -> GTI JSON
//! - `simulate`: synthetic MC batch CSV

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::data::{SimulationSummary, write_simulated_batch};
use crate::domain::{
    CoveragePolicy, DrmConfig, EventColumns, GtiImportConfig, PartitionConfig, SelectConfig, SeparationKind,
    SimulateConfig, SkyDir,
};
use crate::error::{AppError, CoreError};
use crate::gti::IntervalSet;
use crate::io::{
    BatchEntry, CsvTable, EventCsvWriter, ResponseFile, TableSource, load_pointing_file, read_gti_json,
    read_manifest, read_tjd_gti, write_gti_json, write_response_json,
};
use crate::math::{LinearBinner, LogBinner};
use crate::psf::{AngularAcceptance, StaticAcceptance};
use crate::response::ResponseMatrixBuilder;

/// Per-cut tallies for one pass over an event table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutCounts {
    pub rows: usize,
    pub accepted: usize,
    pub time: usize,
    pub energy: usize,
    pub zenith: usize,
    pub psf: usize,
    /// Events skipped under [`CoveragePolicy::Lenient`].
    pub coverage: usize,
    /// Events whose energies fall outside the response binning.
    pub out_of_range: usize,
}

impl CutCounts {
    fn absorb(&mut self, other: &CutCounts) {
        self.rows += other.rows;
        self.accepted += other.accepted;
        self.time += other.time;
        self.energy += other.energy;
        self.zenith += other.zenith;
        self.psf += other.psf;
        self.coverage += other.coverage;
        self.out_of_range += other.out_of_range;
    }
}

// ---------------------------------------------------------------------------
// select
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SelectOutput {
    pub counts: CutCounts,
    pub gti: IntervalSet,
    /// Number of off-axis recomputations, when the PSF cut ran.
    pub off_axis_updates: Option<usize>,
}

pub fn run_select(config: &SelectConfig) -> Result<SelectOutput, AppError> {
    let (tmin, tmax) = config.time_window();
    let mut gti = IntervalSet::new();
    gti.insert_interval(tmin, tmax)?;

    let mut table = CsvTable::open(&config.infile)?;
    let cols = &config.columns;
    let mut required = vec![cols.time.as_str(), cols.energy.as_str()];
    if config.zmax.is_some() {
        required.push(cols.zenith.as_str());
    }
    if config.apply_psf {
        required.extend([cols.ra.as_str(), cols.dec.as_str()]);
    }
    table.require_columns(&required)?;

    let pointing = if config.apply_psf {
        let scfile = config
            .scfile
            .as_deref()
            .ok_or_else(|| AppError::new(2, "The PSF cut needs a pointing table (--scfile)."))?;
        Some(load_pointing_file(scfile)?)
    } else {
        None
    };
    let mut psf = match (&pointing, config.source) {
        (Some(pointing), Some(source)) => Some(AngularAcceptance::new(pointing.cursor(), source, config.separation)),
        (Some(_), None) => return Err(AppError::new(2, "The PSF cut needs a source position (--ra/--dec).")),
        (None, _) => None,
    };

    log::info!(
        "selecting events from '{}' in [{tmin}, {tmax})",
        config.infile.display()
    );

    let mut writer = EventCsvWriter::create(&config.outfile, table.columns())?;
    let mut gti_cursor = gti.cursor();
    let mut counts = CutCounts::default();
    let mut last_time = f64::NEG_INFINITY;
    let mut last_gap: Option<(usize, &'static str)> = None;

    while table.next_row()? {
        counts.rows += 1;
        let time = table.get_f64(&cols.time)?;
        if time < last_time {
            return Err(AppError::new(
                2,
                format!(
                    "Row {}: event times must be non-decreasing ({time} after {last_time}).",
                    table.row_number()
                ),
            ));
        }
        last_time = time;

        if !gti_cursor.accept(time) {
            counts.time += 1;
            continue;
        }
        let energy = table.get_f64(&cols.energy)?;
        if !(energy > 0.0) {
            counts.energy += 1;
            continue;
        }
        if let Some(zmax) = config.zmax {
            if table.get_f64(&cols.zenith)? >= zmax {
                counts.zenith += 1;
                continue;
            }
        }
        if let Some(cut) = psf.as_mut() {
            let dir = event_dir(&table, cols)?;
            match cut.accept(energy, time, dir) {
                Ok(true) => {}
                Ok(false) => {
                    counts.psf += 1;
                    continue;
                }
                Err(CoreError::Coverage { time, reason }) if config.coverage == CoveragePolicy::Lenient => {
                    let gap = (cut.cursor().position(), reason);
                    if last_gap != Some(gap) {
                        log::warn!("skipping events outside pointing coverage: {reason} (t={time})");
                        last_gap = Some(gap);
                    }
                    counts.coverage += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }

        writer.write_row(table.raw_row())?;
        counts.accepted += 1;
    }
    writer.finish()?;
    write_gti_json(&config.gti_out, &gti)?;

    if counts.coverage > 0 {
        log::warn!("{} event(s) skipped outside pointing coverage", counts.coverage);
    }
    log::info!(
        "accepted {} of {} events -> '{}'",
        counts.accepted,
        counts.rows,
        config.outfile.display()
    );

    Ok(SelectOutput {
        counts,
        gti,
        off_axis_updates: psf.as_ref().map(|cut| cut.off_axis_updates()),
    })
}

fn event_dir<T: TableSource>(table: &T, cols: &EventColumns) -> Result<SkyDir, AppError> {
    Ok(SkyDir::new(table.get_f64(&cols.ra)?, table.get_f64(&cols.dec)?))
}

// ---------------------------------------------------------------------------
// drm
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub path: PathBuf,
    pub generated: Option<u64>,
    pub counts: CutCounts,
}

#[derive(Debug, Clone)]
pub struct DrmOutput {
    pub builder: ResponseMatrixBuilder,
    pub batches: Vec<BatchReport>,
    pub generated: u64,
    pub counts: CutCounts,
}

/// Event cuts applied to every simulated batch.
struct BatchCuts<'a> {
    columns: &'a EventColumns,
    true_energy_col: &'a str,
    time: Option<IntervalSet>,
    zmax: Option<f64>,
    psf: Option<StaticAcceptance<SeparationKind>>,
}

pub fn run_drm(config: &DrmConfig) -> Result<DrmOutput, AppError> {
    if !(config.meas_emin > 0.0 && config.meas_emax > config.meas_emin) {
        return Err(AppError::new(
            2,
            "Measured-energy range must satisfy 0 < meas-emin < meas-emax.",
        ));
    }
    let true_binning = LogBinner::new(config.emin, config.emax, config.enumbins)?;
    let meas_binning = LinearBinner::new(config.meas_emin.log10(), config.meas_emax.log10(), config.meas_bins)?;
    let template = ResponseMatrixBuilder::new(
        true_binning,
        meas_binning,
        config.spectral_index,
        config.effective_area,
    );

    let entries = read_manifest(&config.manifest)?;
    let generated = total_generated(&entries, config.ngen)?;

    let time = match (config.tmin, config.tmax) {
        (None, None) => None,
        (tmin, tmax) => Some(IntervalSet::from_intervals([(
            tmin.unwrap_or(f64::MIN),
            tmax.unwrap_or(f64::MAX),
        )])?),
    };
    let cuts = BatchCuts {
        columns: &config.columns,
        true_energy_col: &config.true_energy_col,
        time,
        zmax: config.zmax,
        psf: config
            .psf
            .map(|p| StaticAcceptance::new(p.source, p.off_axis_deg, config.separation)),
    };

    log::info!(
        "building response from {} batch(es), {} generated events",
        entries.len(),
        generated
    );

    // One private builder per batch; merged below in manifest order.
    let partials: Vec<(ResponseMatrixBuilder, CutCounts)> = entries
        .par_iter()
        .map(|entry| accumulate_batch(entry, &template, &cuts))
        .collect::<Result<_, AppError>>()?;

    let mut builder = template;
    let mut batches = Vec::with_capacity(entries.len());
    let mut counts = CutCounts::default();
    for (entry, (partial, batch_counts)) in entries.iter().zip(partials) {
        builder.merge(partial)?;
        counts.absorb(&batch_counts);
        batches.push(BatchReport {
            path: entry.path.clone(),
            generated: entry.generated,
            counts: batch_counts,
        });
    }

    if counts.out_of_range > 0 {
        log::warn!("{} event(s) outside the response binning were skipped", counts.out_of_range);
    }

    builder.add_generated(generated)?;
    builder.finalize()?;

    let doc = ResponseFile::new(builder.to_matrix()?);
    write_response_json(&config.outfile, &doc)?;
    log::info!("wrote response matrix -> '{}'", config.outfile.display());

    Ok(DrmOutput {
        builder,
        batches,
        generated,
        counts,
    })
}

fn total_generated(entries: &[BatchEntry], ngen: Option<u64>) -> Result<u64, AppError> {
    if let Some(n) = ngen {
        return Ok(n);
    }
    entries.iter().try_fold(0u64, |acc, entry| {
        let n = entry.generated.ok_or_else(|| {
            AppError::new(
                2,
                format!(
                    "Manifest entry '{}' has no generated count; list one or pass --ngen.",
                    entry.path.display()
                ),
            )
        })?;
        acc.checked_add(n).ok_or_else(|| {
            AppError::new(
                2,
                format!(
                    "Generated counts overflow at manifest entry '{}'; pass --ngen instead.",
                    entry.path.display()
                ),
            )
        })
    })
}

fn accumulate_batch(
    entry: &BatchEntry,
    template: &ResponseMatrixBuilder,
    cuts: &BatchCuts<'_>,
) -> Result<(ResponseMatrixBuilder, CutCounts), AppError> {
    let mut table = CsvTable::open(&entry.path)?;
    let cols = cuts.columns;
    let mut required = vec![cuts.true_energy_col, cols.energy.as_str()];
    if cuts.time.is_some() {
        required.push(cols.time.as_str());
    }
    if cuts.zmax.is_some() {
        required.push(cols.zenith.as_str());
    }
    if cuts.psf.is_some() {
        required.extend([cols.ra.as_str(), cols.dec.as_str()]);
    }
    table.require_columns(&required)?;

    let mut builder = template.empty_like();
    let mut counts = CutCounts::default();

    while table.next_row()? {
        counts.rows += 1;
        let measured = table.get_f64(&cols.energy)?;
        if !(measured > 0.0) {
            counts.energy += 1;
            continue;
        }
        if let Some(gti) = &cuts.time {
            if !gti.accept(table.get_f64(&cols.time)?) {
                counts.time += 1;
                continue;
            }
        }
        if let Some(zmax) = cuts.zmax {
            if table.get_f64(&cols.zenith)? >= zmax {
                counts.zenith += 1;
                continue;
            }
        }
        if let Some(psf) = &cuts.psf {
            if !psf.accept(measured, event_dir(&table, cols)?) {
                counts.psf += 1;
                continue;
            }
        }

        let true_energy = table.get_f64(cuts.true_energy_col)?;
        match builder.ingest(true_energy, measured) {
            Ok(()) => counts.accepted += 1,
            Err(CoreError::BinRange { .. }) => counts.out_of_range += 1,
            Err(err) => return Err(err.into()),
        }
    }

    log::debug!(
        "batch '{}': {} rows, {} ingested",
        table.label(),
        counts.rows,
        counts.accepted
    );
    Ok((builder, counts))
}

// ---------------------------------------------------------------------------
// partition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PartitionChunk {
    pub path: PathBuf,
    pub gti_path: PathBuf,
    pub rows: usize,
    pub gti: IntervalSet,
}

/// Output paths for chunk `index`: `<prefix>_NNNN.csv` and `<prefix>_NNNN_gti.json`.
pub fn chunk_paths(prefix: &Path, index: usize) -> (PathBuf, PathBuf) {
    let stem = prefix.as_os_str().to_string_lossy();
    (
        PathBuf::from(format!("{stem}_{index:04}.csv")),
        PathBuf::from(format!("{stem}_{index:04}_gti.json")),
    )
}

/// Split an event table into chunks of `rows_per_file` rows.
///
/// Chunk `k` gets the input GTI clipped to `[previous stop, last event time]`;
/// the first chunk starts at the GTI minimum and the last one ends at the GTI
/// maximum.
pub fn run_partition(config: &PartitionConfig) -> Result<Vec<PartitionChunk>, AppError> {
    if config.rows_per_file == 0 {
        return Err(AppError::new(2, "Partition size must be > 0."));
    }
    let gti = read_gti_json(&config.gti)?;
    let gti_min = gti.min_value()?;
    let gti_max = gti.max_value()?;

    let mut table = CsvTable::open(&config.infile)?;
    table.require_columns(&[config.time_col.as_str()])?;
    let headers: Vec<String> = table.columns().to_vec();

    let mut chunks = Vec::new();
    let mut start_time = gti_min;
    let mut has_row = table.next_row()?;

    loop {
        let (path, gti_path) = chunk_paths(&config.prefix, chunks.len());
        let mut writer = EventCsvWriter::create(&path, &headers)?;
        let mut stop_time = start_time;
        while has_row && writer.rows() < config.rows_per_file {
            stop_time = table.get_f64(&config.time_col)?;
            writer.write_row(table.raw_row())?;
            has_row = table.next_row()?;
        }
        let rows = writer.finish()?;

        if !has_row {
            stop_time = gti_max;
        }
        let chunk_gti = gti.apply_time_range_cut(start_time, stop_time);
        write_gti_json(&gti_path, &chunk_gti)?;
        log::debug!("chunk {}: {rows} rows, [{start_time}, {stop_time}]", chunks.len());

        chunks.push(PartitionChunk {
            path,
            gti_path,
            rows,
            gti: chunk_gti,
        });
        start_time = stop_time;

        if !has_row {
            break;
        }
    }

    log::info!("partitioned '{}' into {} file(s)", config.infile.display(), chunks.len());
    Ok(chunks)
}

// ---------------------------------------------------------------------------
// gti-import / simulate
// ---------------------------------------------------------------------------

pub fn run_gti_import(config: &GtiImportConfig) -> Result<IntervalSet, AppError> {
    let mut gti = read_tjd_gti(&config.infile, &config.epoch)?;
    if config.tmin.is_some() || config.tmax.is_some() {
        gti = gti.apply_time_range_cut(
            config.tmin.unwrap_or(f64::NEG_INFINITY),
            config.tmax.unwrap_or(f64::INFINITY),
        );
    }
    write_gti_json(&config.outfile, &gti)?;
    log::info!(
        "imported {} interval(s), ontime {:.1} s -> '{}'",
        gti.len(),
        gti.ontime(),
        config.outfile.display()
    );
    Ok(gti)
}

pub fn run_simulate(config: &SimulateConfig) -> Result<SimulationSummary, AppError> {
    let summary = write_simulated_batch(&config.outfile, config)?;
    log::info!(
        "simulated {} events -> '{}'",
        summary.written,
        config.outfile.display()
    );
    Ok(summary)
}
