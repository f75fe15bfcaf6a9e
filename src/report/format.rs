//! Formatted terminal output for the tool summaries.
//!
//! Formatting lives here so the pipelines only return values and output
//! changes stay localized.

use std::fmt::Write as _;

use crate::app::pipeline::{CutCounts, DrmOutput, PartitionChunk, SelectOutput};
use crate::data::SimulationSummary;
use crate::domain::{DrmConfig, SelectConfig, SimulateConfig};
use crate::gti::IntervalSet;
use crate::math::Binner;

pub fn format_select_summary(output: &SelectOutput, config: &SelectConfig) -> String {
    let mut out = String::new();
    let (tmin, tmax) = config.time_window();

    out.push_str("=== evr select ===\n");
    let _ = writeln!(out, "Input: {}", config.infile.display());
    let _ = writeln!(out, "Window: [{tmin:.3}, {tmax:.3}) s | ontime={:.3} s", output.gti.ontime());
    if let Some(zmax) = config.zmax {
        let _ = writeln!(out, "Zenith: < {zmax:.1} deg");
    }
    if let (true, Some(source)) = (config.apply_psf, config.source) {
        let _ = writeln!(
            out,
            "PSF: source=({:.4}, {:.4}) | separation={:?} | coverage={:?}",
            source.ra, source.dec, config.separation, config.coverage
        );
        if let Some(updates) = output.off_axis_updates {
            let _ = writeln!(out, "     off-axis updates={updates}");
        }
    }
    out.push('\n');
    out.push_str(&format_cut_table(&output.counts));
    let _ = writeln!(out, "\nAccepted -> {}", config.outfile.display());
    let _ = writeln!(out, "GTI      -> {}", config.gti_out.display());
    out
}

pub fn format_drm_summary(output: &DrmOutput, config: &DrmConfig) -> String {
    let mut out = String::new();
    let builder = &output.builder;

    out.push_str("=== evr drm ===\n");
    let _ = writeln!(
        out,
        "True energy: [{:.4e}, {:.4e}] MeV, {} log bins",
        builder.true_binning().lo(),
        builder.true_binning().hi(),
        builder.true_binning().num_bins()
    );
    let _ = writeln!(
        out,
        "Measured:    [{:.4e}, {:.4e}] MeV, {} bins in log10",
        config.meas_emin,
        config.meas_emax,
        builder.meas_binning().num_bins()
    );
    let _ = writeln!(
        out,
        "Index={:.3} | area={:.4e} cm^2 | generated={}",
        builder.spectral_index(),
        builder.effective_area(),
        output.generated
    );

    out.push_str("\nBatches:\n");
    for batch in &output.batches {
        let generated = batch
            .generated
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {:<40} rows={:>8} ingested={:>8} generated={generated}",
            truncate(&batch.path.display().to_string(), 40),
            batch.counts.rows,
            batch.counts.accepted
        );
    }
    out.push('\n');
    out.push_str(&format_cut_table(&output.counts));

    out.push_str("\nRow sums (true bin -> sum over measured):\n");
    if let Ok(matrix) = builder.to_matrix() {
        for (i, row) in matrix.rows.iter().enumerate() {
            let iv = builder.true_binning().interval(i);
            let _ = writeln!(
                out,
                "  [{:>10.3e}, {:>10.3e})  {:.6e}",
                iv.begin,
                iv.end,
                row.iter().sum::<f64>()
            );
        }
    }
    let _ = writeln!(out, "\nResponse -> {}", config.outfile.display());
    out
}

pub fn format_partition_summary(chunks: &[PartitionChunk]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<40} {:>8} {:>14} {:>14}", "file", "rows", "tstart", "tstop");
    let _ = writeln!(out, "{:-<40} {:-<8} {:-<14} {:-<14}", "", "", "", "");
    for chunk in chunks {
        let _ = writeln!(
            out,
            "{:<40} {:>8} {:>14} {:>14}",
            truncate(&chunk.path.display().to_string(), 40),
            chunk.rows,
            fmt_bound(chunk.gti.min_value().ok()),
            fmt_bound(chunk.gti.max_value().ok()),
        );
    }
    out
}

pub fn format_gti_summary(gti: &IntervalSet) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "GTI: {} interval(s) | [{}, {}] | ontime={:.3} s",
        gti.len(),
        fmt_bound(gti.min_value().ok()).trim(),
        fmt_bound(gti.max_value().ok()).trim(),
        gti.ontime()
    );
    out
}

pub fn format_simulate_summary(summary: &SimulationSummary, config: &SimulateConfig) -> String {
    format!(
        "Simulated {} events (index={:.3}, E=[{:.3e}, {:.3e}] MeV, seed={}) -> {}\nManifest line: {} {}\n",
        summary.written,
        config.spectral_index,
        config.emin,
        config.emax,
        config.seed,
        config.outfile.display(),
        config.outfile.display(),
        summary.generated
    )
}

fn format_cut_table(counts: &CutCounts) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<22} {:>10}", "cut", "events");
    let _ = writeln!(out, "{:-<22} {:-<10}", "", "");
    let rows = [
        ("rows read", counts.rows),
        ("time window", counts.time),
        ("energy <= 0", counts.energy),
        ("zenith", counts.zenith),
        ("psf", counts.psf),
        ("outside coverage", counts.coverage),
        ("outside binning", counts.out_of_range),
        ("accepted", counts.accepted),
    ];
    for (label, n) in rows {
        let _ = writeln!(out, "{label:<22} {n:>10}");
    }
    out
}

fn fmt_bound(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:>14.3}"),
        None => format!("{:>14}", "-"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cut_table_lists_every_counter() {
        let counts = CutCounts {
            rows: 10,
            accepted: 4,
            time: 2,
            energy: 1,
            zenith: 1,
            psf: 1,
            coverage: 1,
            out_of_range: 0,
        };
        let table = format_cut_table(&counts);
        assert!(table.contains("rows read"));
        assert!(table.lines().any(|l| l.starts_with("accepted") && l.trim_end().ends_with('4')));
        assert_eq!(table.lines().count(), 10);
    }

    #[test]
    fn gti_summary_handles_empty_sets() {
        let text = format_gti_summary(&IntervalSet::new());
        assert!(text.contains("0 interval(s) | [-, -]"));

        let set = IntervalSet::from_intervals([(0.0, 5.0), (10.0, 12.5)]).unwrap();
        let text = format_gti_summary(&set);
        assert!(text.contains("2 interval(s)"));
        assert!(text.contains("ontime=7.500 s"));
    }

    #[test]
    fn truncate_marks_long_names() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 5), "abcd.");
    }
}
