//! Fixed partitions of a value range into bins.
//!
//! Both binners define their bin edges through a single `edge(i)` function and
//! correct the closed-form index against those edges, so `index_of` and
//! `interval` always agree exactly at the boundaries.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// `[begin, end)` bounds of one bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinInterval {
    pub begin: f64,
    pub end: f64,
}

pub trait Binner {
    fn num_bins(&self) -> usize;

    /// Lower edge of the first bin.
    fn lo(&self) -> f64;

    /// Upper edge of the last bin.
    fn hi(&self) -> f64;

    /// Edge `i` for `i` in `0..=num_bins()`.
    fn edge(&self, i: usize) -> f64;

    /// Closed-form (uncorrected) fractional bin position of `value`.
    fn raw_position(&self, value: f64) -> f64;

    /// Bin containing `value`.
    ///
    /// `value == hi()` maps to the last bin; anything else outside
    /// `[lo(), hi())` is a [`CoreError::BinRange`].
    fn index_of(&self, value: f64) -> Result<usize, CoreError> {
        let n = self.num_bins();
        let (lo, hi) = (self.lo(), self.hi());
        if n == 0 || !value.is_finite() || value < lo || value > hi {
            return Err(CoreError::BinRange { value, lo, hi });
        }
        if value == hi {
            return Ok(n - 1);
        }

        let raw = self.raw_position(value).floor();
        let mut idx = if raw.is_finite() && raw > 0.0 {
            (raw as usize).min(n - 1)
        } else {
            0
        };
        while idx > 0 && value < self.edge(idx) {
            idx -= 1;
        }
        while idx + 1 < n && value >= self.edge(idx + 1) {
            idx += 1;
        }
        Ok(idx)
    }

    /// Exact bounds of bin `index`.
    ///
    /// # Panics
    /// Panics if `index >= num_bins()`.
    fn interval(&self, index: usize) -> BinInterval {
        assert!(index < self.num_bins(), "bin index {index} out of range");
        BinInterval {
            begin: self.edge(index),
            end: self.edge(index + 1),
        }
    }

    fn edges(&self) -> Vec<f64> {
        (0..=self.num_bins()).map(|i| self.edge(i)).collect()
    }
}

fn validate(lo: f64, hi: f64, bins: usize) -> Result<(), CoreError> {
    if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
        return Err(CoreError::InvalidRange {
            start: lo,
            stop: hi,
            reason: "binner bounds must be finite with lo < hi",
        });
    }
    if bins == 0 {
        return Err(CoreError::InvalidRange {
            start: lo,
            stop: hi,
            reason: "binner needs at least one bin",
        });
    }
    Ok(())
}

/// Equal-width bins on `[lo, hi)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearBinner {
    lo: f64,
    hi: f64,
    bins: usize,
}

impl LinearBinner {
    pub fn new(lo: f64, hi: f64, bins: usize) -> Result<Self, CoreError> {
        validate(lo, hi, bins)?;
        Ok(Self { lo, hi, bins })
    }
}

impl Binner for LinearBinner {
    fn num_bins(&self) -> usize {
        self.bins
    }

    fn lo(&self) -> f64 {
        self.lo
    }

    fn hi(&self) -> f64 {
        self.hi
    }

    fn edge(&self, i: usize) -> f64 {
        if i == 0 {
            self.lo
        } else if i >= self.bins {
            self.hi
        } else {
            self.lo + (self.hi - self.lo) * (i as f64 / self.bins as f64)
        }
    }

    fn raw_position(&self, value: f64) -> f64 {
        self.bins as f64 * (value - self.lo) / (self.hi - self.lo)
    }
}

/// Bins of equal width in `ln(value)` on `[lo, hi)`, `lo > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogBinner {
    lo: f64,
    hi: f64,
    bins: usize,
}

impl LogBinner {
    pub fn new(lo: f64, hi: f64, bins: usize) -> Result<Self, CoreError> {
        validate(lo, hi, bins)?;
        if lo <= 0.0 {
            return Err(CoreError::InvalidRange {
                start: lo,
                stop: hi,
                reason: "logarithmic binner needs lo > 0",
            });
        }
        Ok(Self { lo, hi, bins })
    }
}

impl Binner for LogBinner {
    fn num_bins(&self) -> usize {
        self.bins
    }

    fn lo(&self) -> f64 {
        self.lo
    }

    fn hi(&self) -> f64 {
        self.hi
    }

    fn edge(&self, i: usize) -> f64 {
        if i == 0 {
            self.lo
        } else if i >= self.bins {
            self.hi
        } else {
            let step = (self.hi / self.lo).ln() / self.bins as f64;
            self.lo * (step * i as f64).exp()
        }
    }

    fn raw_position(&self, value: f64) -> f64 {
        self.bins as f64 * (value / self.lo).ln() / (self.hi / self.lo).ln()
    }
}

/// Either binner, for places that pick the scale at runtime or serialize it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scale", rename_all = "lowercase")]
pub enum Binning {
    Linear(LinearBinner),
    Log(LogBinner),
}

impl Binner for Binning {
    fn num_bins(&self) -> usize {
        match self {
            Binning::Linear(b) => b.num_bins(),
            Binning::Log(b) => b.num_bins(),
        }
    }

    fn lo(&self) -> f64 {
        match self {
            Binning::Linear(b) => b.lo(),
            Binning::Log(b) => b.lo(),
        }
    }

    fn hi(&self) -> f64 {
        match self {
            Binning::Linear(b) => b.hi(),
            Binning::Log(b) => b.hi(),
        }
    }

    fn edge(&self, i: usize) -> f64 {
        match self {
            Binning::Linear(b) => b.edge(i),
            Binning::Log(b) => b.edge(i),
        }
    }

    fn raw_position(&self, value: f64) -> f64 {
        match self {
            Binning::Linear(b) => b.raw_position(value),
            Binning::Log(b) => b.raw_position(value),
        }
    }
}

impl From<LinearBinner> for Binning {
    fn from(b: LinearBinner) -> Self {
        Binning::Linear(b)
    }
}

impl From<LogBinner> for Binning {
    fn from(b: LogBinner) -> Self {
        Binning::Log(b)
    }
}
