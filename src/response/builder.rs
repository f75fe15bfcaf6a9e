//! Detector response matrix built from simulated events.
//!
//! Two phases:
//!
//! 1. **Accumulate**: each simulated event increments `counts[i][j]`, where
//!    `i` is the true-energy bin and `j` the measured bin of `log10(measured)`.
//!    The number of events thrown is recorded alongside.
//! 2. **Finalize**: each true-energy row is scaled by
//!    `effective_area / generated[i] / spectral_weight(i)`.
//!
//! Spectral weights assume an incident flux `∝ E^spectral_index`
//! (see [`PowerLaw`]).

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::math::{Binner, Binning, PowerLaw};

#[derive(Debug, Clone)]
pub struct ResponseMatrixBuilder {
    true_binning: Binning,
    meas_binning: Binning,
    power_law: PowerLaw,
    effective_area: f64,
    counts: DMatrix<f64>,
    generated: Vec<u64>,
    response: Option<DMatrix<f64>>,
}

impl ResponseMatrixBuilder {
    /// `meas_binning` partitions `log10(measured value)`.
    pub fn new(
        true_binning: impl Into<Binning>,
        meas_binning: impl Into<Binning>,
        spectral_index: f64,
        effective_area: f64,
    ) -> Self {
        let true_binning = true_binning.into();
        let meas_binning = meas_binning.into();
        let n_true = true_binning.num_bins();
        let n_meas = meas_binning.num_bins();
        Self {
            true_binning,
            meas_binning,
            power_law: PowerLaw::new(spectral_index),
            effective_area,
            counts: DMatrix::zeros(n_true, n_meas),
            generated: vec![0; n_true],
            response: None,
        }
    }

    /// A builder with the same binning and normalization but no data, for
    /// accumulating one batch privately before [`merge`](Self::merge).
    pub fn empty_like(&self) -> Self {
        Self::new(
            self.true_binning,
            self.meas_binning,
            self.power_law.spectral_index,
            self.effective_area,
        )
    }

    fn ensure_accumulating(&self) -> Result<(), CoreError> {
        if self.response.is_some() {
            return Err(CoreError::AlreadyFinalized);
        }
        Ok(())
    }

    pub fn ingest(&mut self, true_energy: f64, measured_value: f64) -> Result<(), CoreError> {
        self.ensure_accumulating()?;
        let i = self.true_binning.index_of(true_energy)?;
        let j = self.meas_binning.index_of(measured_value.log10())?;
        self.counts[(i, j)] += 1.0;
        Ok(())
    }

    /// Record `n` events thrown over the full simulated range; applies to
    /// every true-energy bin.
    pub fn add_generated(&mut self, n: u64) -> Result<(), CoreError> {
        self.ensure_accumulating()?;
        let totals = self
            .generated
            .iter()
            .enumerate()
            .map(|(bin, &g)| g.checked_add(n).ok_or(CoreError::GeneratedOverflow { bin }))
            .collect::<Result<Vec<_>, _>>()?;
        self.generated = totals;
        Ok(())
    }

    pub fn set_generated(&mut self, bin: usize, n: u64) -> Result<(), CoreError> {
        self.ensure_accumulating()?;
        let n_true = self.generated.len();
        let slot = self.generated.get_mut(bin).ok_or(CoreError::BinRange {
            value: bin as f64,
            lo: 0.0,
            hi: n_true as f64,
        })?;
        *slot = n;
        Ok(())
    }

    pub fn set_area(&mut self, area: f64) -> Result<(), CoreError> {
        self.ensure_accumulating()?;
        self.effective_area = area;
        Ok(())
    }

    /// Fold another builder's counts and generated totals into this one.
    pub fn merge(&mut self, other: ResponseMatrixBuilder) -> Result<(), CoreError> {
        self.ensure_accumulating()?;
        other.ensure_accumulating()?;
        if self.true_binning != other.true_binning
            || self.meas_binning != other.meas_binning
            || self.power_law != other.power_law
        {
            return Err(CoreError::BinningMismatch);
        }
        let totals = self
            .generated
            .iter()
            .zip(&other.generated)
            .enumerate()
            .map(|(bin, (&g, &o))| g.checked_add(o).ok_or(CoreError::GeneratedOverflow { bin }))
            .collect::<Result<Vec<_>, _>>()?;
        self.counts += other.counts;
        self.generated = totals;
        Ok(())
    }

    /// Fraction of the generated spectrum that falls in true-energy bin `bin`.
    ///
    /// # Panics
    /// Panics if `bin` is not a valid true-energy bin.
    pub fn spectral_weight(&self, bin: usize) -> f64 {
        let iv = self.true_binning.interval(bin);
        self.power_law
            .band_fraction(iv.begin, iv.end, self.true_binning.lo(), self.true_binning.hi())
    }

    pub fn finalize(&mut self) -> Result<(), CoreError> {
        self.ensure_accumulating()?;
        if let Some(bin) = self.generated.iter().position(|&g| g == 0) {
            return Err(CoreError::ZeroGenerated { bin });
        }

        let weights: Vec<f64> = (0..self.generated.len()).map(|i| self.spectral_weight(i)).collect();
        let bad = weights
            .iter()
            .enumerate()
            .find(|&(_, w)| !(w.is_finite() && *w > 0.0));
        if let Some((bin, &weight)) = bad {
            return Err(CoreError::InvalidWeight { bin, weight });
        }

        let mut response = self.counts.clone();
        for (i, weight) in weights.into_iter().enumerate() {
            let norm = self.effective_area / self.generated[i] as f64 / weight;
            log::debug!("true bin {i}: norm={norm:.6e}");
            response.row_mut(i).scale_mut(norm);
        }
        self.response = Some(response);
        Ok(())
    }

    fn finalized(&self) -> Result<&DMatrix<f64>, CoreError> {
        self.response.as_ref().ok_or(CoreError::NotFinalized)
    }

    /// Normalized response row for the true-energy bin containing `true_energy`.
    pub fn lookup(&self, true_energy: f64) -> Result<Vec<f64>, CoreError> {
        let response = self.finalized()?;
        let i = self.true_binning.index_of(true_energy)?;
        Ok(response.row(i).iter().copied().collect())
    }

    /// Replace a finalized row with externally computed values.
    pub fn set_row(&mut self, bin: usize, row: &[f64]) -> Result<(), CoreError> {
        let n_true = self.true_binning.num_bins();
        let n_meas = self.meas_binning.num_bins();
        let response = self.response.as_mut().ok_or(CoreError::NotFinalized)?;
        if bin >= n_true {
            return Err(CoreError::BinRange {
                value: bin as f64,
                lo: 0.0,
                hi: n_true as f64,
            });
        }
        if row.len() != n_meas {
            return Err(CoreError::RowLength {
                expected: n_meas,
                got: row.len(),
            });
        }
        for (j, &v) in row.iter().enumerate() {
            response[(bin, j)] = v;
        }
        Ok(())
    }

    pub fn set_row_at_energy(&mut self, true_energy: f64, row: &[f64]) -> Result<(), CoreError> {
        self.finalized()?;
        let bin = self.true_binning.index_of(true_energy)?;
        self.set_row(bin, row)
    }

    pub fn is_finalized(&self) -> bool {
        self.response.is_some()
    }

    pub fn counts(&self) -> &DMatrix<f64> {
        &self.counts
    }

    pub fn total_counts(&self) -> f64 {
        self.counts.sum()
    }

    pub fn generated(&self) -> &[u64] {
        &self.generated
    }

    pub fn true_binning(&self) -> &Binning {
        &self.true_binning
    }

    pub fn meas_binning(&self) -> &Binning {
        &self.meas_binning
    }

    pub fn spectral_index(&self) -> f64 {
        self.power_law.spectral_index
    }

    pub fn effective_area(&self) -> f64 {
        self.effective_area
    }

    /// Serializable snapshot of the finalized response.
    pub fn to_matrix(&self) -> Result<ResponseMatrix, CoreError> {
        let response = self.finalized()?;
        let rows = response
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        Ok(ResponseMatrix {
            spectral_index: self.power_law.spectral_index,
            effective_area: self.effective_area,
            true_binning: self.true_binning,
            meas_binning: self.meas_binning,
            generated: self.generated.clone(),
            rows,
        })
    }
}

/// Finalized response, row-major by true-energy bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMatrix {
    pub spectral_index: f64,
    pub effective_area: f64,
    pub true_binning: Binning,
    /// Binning of `log10(measured value)`.
    pub meas_binning: Binning,
    pub generated: Vec<u64>,
    pub rows: Vec<Vec<f64>>,
}

impl ResponseMatrix {
    pub fn lookup(&self, true_energy: f64) -> Result<&[f64], CoreError> {
        let i = self.true_binning.index_of(true_energy)?;
        self.rows.get(i).map(Vec::as_slice).ok_or(CoreError::RowLength {
            expected: self.true_binning.num_bins(),
            got: self.rows.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{LinearBinner, LogBinner};

    fn meas() -> LinearBinner {
        // log10(E) from 1 to 4 in 6 bins of 0.5 decade.
        LinearBinner::new(1.0, 4.0, 6).unwrap()
    }

    #[test]
    fn single_bin_normalization_matches_formula() {
        let true_binner = LogBinner::new(100.0, 1000.0, 1).unwrap();
        let mut drm = ResponseMatrixBuilder::new(true_binner, meas(), -2.0, 6e4);
        drm.add_generated(1000).unwrap();
        for _ in 0..37 {
            // log10(250) = 2.398 -> measured bin 2 ([2.0, 2.5)).
            drm.ingest(300.0, 250.0).unwrap();
        }
        drm.finalize().unwrap();

        let weight = (1000.0f64.powf(-1.0) - 100.0f64.powf(-1.0)) / (1000.0f64.powf(-1.0) - 100.0f64.powf(-1.0));
        let expected = 6e4 / 1000.0 / weight * 37.0;
        let row = drm.lookup(300.0).unwrap();
        assert_eq!(row.len(), 6);
        assert!((row[2] - expected).abs() < 1e-9 * expected);
        assert!(row.iter().enumerate().all(|(j, &v)| j == 2 || v == 0.0));
    }

    #[test]
    fn multi_bin_rows_use_per_bin_weights() {
        let true_binner = LogBinner::new(10.0, 1e4, 3).unwrap();
        let mut drm = ResponseMatrixBuilder::new(true_binner, meas(), -2.0, 6e4);
        drm.add_generated(500).unwrap();
        drm.add_generated(500).unwrap();
        drm.ingest(50.0, 40.0).unwrap();
        drm.ingest(500.0, 400.0).unwrap();
        drm.ingest(500.0, 450.0).unwrap();
        drm.finalize().unwrap();

        let w1 = (1000.0f64.powf(-1.0) - 100.0f64.powf(-1.0)) / (1e4f64.powf(-1.0) - 10.0f64.powf(-1.0));
        assert!((drm.spectral_weight(1) - w1).abs() < 1e-12);
        let row = drm.lookup(500.0).unwrap();
        // log10(400) and log10(450) both fall in [2.5, 3.0).
        assert!((row[3] - 6e4 / 1000.0 / w1 * 2.0).abs() < 1e-6);
    }

    #[test]
    fn index_minus_one_weights_are_log_fractions() {
        let true_binner = LogBinner::new(10.0, 1e4, 3).unwrap();
        let drm = ResponseMatrixBuilder::new(true_binner, meas(), -1.0, 1.0);
        for i in 0..3 {
            assert!((drm.spectral_weight(i) - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn lookup_before_finalize_fails() {
        let true_binner = LogBinner::new(10.0, 1e4, 3).unwrap();
        let mut drm = ResponseMatrixBuilder::new(true_binner, meas(), -2.0, 6e4);
        assert_eq!(drm.lookup(100.0), Err(CoreError::NotFinalized));
        assert_eq!(drm.set_row(0, &[0.0; 6]), Err(CoreError::NotFinalized));
        assert!(drm.to_matrix().is_err());
    }

    #[test]
    fn zero_generated_bins_cannot_be_normalized() {
        let true_binner = LogBinner::new(10.0, 1e4, 2).unwrap();
        let mut drm = ResponseMatrixBuilder::new(true_binner, meas(), -2.0, 6e4);
        drm.set_generated(0, 10).unwrap();
        assert_eq!(drm.finalize(), Err(CoreError::ZeroGenerated { bin: 1 }));
        assert!(!drm.is_finalized());
    }

    #[test]
    fn finalized_builder_rejects_further_ingest() {
        let true_binner = LogBinner::new(10.0, 1e4, 2).unwrap();
        let mut drm = ResponseMatrixBuilder::new(true_binner, meas(), -2.0, 6e4);
        drm.add_generated(10).unwrap();
        drm.finalize().unwrap();
        assert_eq!(drm.ingest(100.0, 100.0), Err(CoreError::AlreadyFinalized));
        assert_eq!(drm.finalize(), Err(CoreError::AlreadyFinalized));
    }

    #[test]
    fn out_of_range_events_are_not_counted() {
        let true_binner = LogBinner::new(10.0, 1e4, 2).unwrap();
        let mut drm = ResponseMatrixBuilder::new(true_binner, meas(), -2.0, 6e4);
        assert!(matches!(drm.ingest(5.0, 100.0), Err(CoreError::BinRange { .. })));
        assert!(matches!(drm.ingest(100.0, 0.0), Err(CoreError::BinRange { .. })));
        assert!(matches!(drm.ingest(100.0, 1e5), Err(CoreError::BinRange { .. })));
        assert_eq!(drm.total_counts(), 0.0);
    }

    #[test]
    fn set_row_overrides_values() {
        let true_binner = LogBinner::new(10.0, 1e4, 2).unwrap();
        let mut drm = ResponseMatrixBuilder::new(true_binner, meas(), -2.0, 6e4);
        drm.add_generated(10).unwrap();
        drm.finalize().unwrap();
        let row = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        drm.set_row_at_energy(5000.0, &row).unwrap();
        assert_eq!(drm.lookup(5000.0).unwrap(), row.to_vec());
        assert_eq!(
            drm.set_row(0, &[1.0]),
            Err(CoreError::RowLength { expected: 6, got: 1 })
        );
        assert!(matches!(drm.set_row(2, &row), Err(CoreError::BinRange { .. })));
    }

    #[test]
    fn merge_equals_sequential_ingest() {
        let true_binner = LogBinner::new(10.0, 1e4, 4).unwrap();
        let events = [(20.0, 15.0), (200.0, 180.0), (2000.0, 2500.0), (20.0, 30.0), (9000.0, 8000.0)];

        let mut sequential = ResponseMatrixBuilder::new(true_binner, meas(), -2.1, 6e4);
        for &(t, m) in &events {
            sequential.ingest(t, m).unwrap();
        }
        sequential.add_generated(300).unwrap();

        let mut merged = sequential.empty_like();
        let mut a = merged.empty_like();
        let mut b = merged.empty_like();
        for &(t, m) in &events[..2] {
            a.ingest(t, m).unwrap();
        }
        for &(t, m) in &events[2..] {
            b.ingest(t, m).unwrap();
        }
        a.add_generated(100).unwrap();
        b.add_generated(200).unwrap();
        merged.merge(a).unwrap();
        merged.merge(b).unwrap();

        assert_eq!(merged.counts(), sequential.counts());
        assert_eq!(merged.generated(), sequential.generated());
    }

    #[test]
    fn generated_totals_do_not_wrap() {
        let true_binner = LogBinner::new(10.0, 1e4, 2).unwrap();
        let mut drm = ResponseMatrixBuilder::new(true_binner, meas(), -2.0, 6e4);
        drm.add_generated(u64::MAX).unwrap();
        assert_eq!(drm.add_generated(1), Err(CoreError::GeneratedOverflow { bin: 0 }));
        assert_eq!(drm.generated(), &[u64::MAX; 2]);

        let mut other = drm.empty_like();
        other.set_generated(1, 1).unwrap();
        assert_eq!(drm.merge(other), Err(CoreError::GeneratedOverflow { bin: 1 }));
        assert_eq!(drm.generated(), &[u64::MAX; 2]);
    }

    #[test]
    fn true_binning_touching_zero_cannot_be_normalized() {
        let true_binner = LinearBinner::new(0.0, 100.0, 2).unwrap();
        let meas_binner = LinearBinner::new(0.0, 3.0, 3).unwrap();
        let mut drm = ResponseMatrixBuilder::new(true_binner, meas_binner, -2.0, 6e4);
        drm.add_generated(10).unwrap();
        drm.ingest(70.0, 20.0).unwrap();
        assert!(matches!(drm.finalize(), Err(CoreError::InvalidWeight { bin: 0, .. })));
        assert!(!drm.is_finalized());
    }

    #[test]
    fn set_area_rescales_rows_until_finalized() {
        let true_binner = LogBinner::new(100.0, 1000.0, 1).unwrap();
        let mut base = ResponseMatrixBuilder::new(true_binner, meas(), -2.0, 6e4);
        base.add_generated(100).unwrap();
        base.ingest(300.0, 250.0).unwrap();

        let mut doubled = base.clone();
        doubled.set_area(1.2e5).unwrap();
        assert_eq!(doubled.effective_area(), 1.2e5);

        base.finalize().unwrap();
        doubled.finalize().unwrap();
        let expected = 2.0 * base.lookup(300.0).unwrap()[2];
        assert!((doubled.lookup(300.0).unwrap()[2] - expected).abs() < 1e-9 * expected);
        assert_eq!(doubled.set_area(1.0), Err(CoreError::AlreadyFinalized));
    }

    #[test]
    fn merge_rejects_different_binnings() {
        let mut a = ResponseMatrixBuilder::new(LogBinner::new(10.0, 1e4, 4).unwrap(), meas(), -2.0, 6e4);
        let b = ResponseMatrixBuilder::new(LogBinner::new(10.0, 1e4, 5).unwrap(), meas(), -2.0, 6e4);
        assert_eq!(a.merge(b), Err(CoreError::BinningMismatch));
    }

    #[test]
    fn matrix_snapshot_lookup_matches_builder() {
        let true_binner = LogBinner::new(10.0, 1e4, 3).unwrap();
        let mut drm = ResponseMatrixBuilder::new(true_binner, meas(), -2.0, 6e4);
        drm.add_generated(100).unwrap();
        drm.ingest(500.0, 400.0).unwrap();
        drm.finalize().unwrap();
        let matrix = drm.to_matrix().unwrap();
        assert_eq!(matrix.rows.len(), 3);
        assert_eq!(matrix.lookup(500.0).unwrap(), drm.lookup(500.0).unwrap().as_slice());
    }
}
