//! Power-law spectral weights.
//!
//! Convention used throughout the crate: the incident photon flux is
//! `dN/dE ∝ E^spectral_index` (so a typical soft source has an index of `-2`).
//!
//! The fraction of events thrown into `[e_begin, e_end)` out of a sample
//! generated on `[e_min, e_max)` is:
//!
//! ```text
//! index == -1 : ln(e_end/e_begin) / ln(e_max/e_min)
//! otherwise   : (e_end^(1+index) - e_begin^(1+index)) / (e_max^(1+index) - e_min^(1+index))
//! ```
//!
//! Numerical notes:
//! - Power differences are evaluated as `expm1(p·ln e1) - expm1(p·ln e0)`,
//!   which is algebraically identical and keeps precision when `p = 1 + index`
//!   is tiny (index close to, but not exactly, `-1`).
//! - Sampling works in `ln E` with `ln1p`/`expm1` for the same reason.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLaw {
    /// Exponent of `E` in the incident flux.
    pub spectral_index: f64,
}

impl PowerLaw {
    pub fn new(spectral_index: f64) -> Self {
        Self { spectral_index }
    }

    fn is_log_case(&self) -> bool {
        self.spectral_index == -1.0
    }

    /// `e1^p - e0^p` with `p = 1 + spectral_index`.
    fn pow_diff(&self, e0: f64, e1: f64) -> f64 {
        let p = 1.0 + self.spectral_index;
        (p * e1.ln()).exp_m1() - (p * e0.ln()).exp_m1()
    }

    /// Fraction of a sample generated on `[e_min, e_max)` that lands in
    /// `[e_begin, e_end)`.
    pub fn band_fraction(&self, e_begin: f64, e_end: f64, e_min: f64, e_max: f64) -> f64 {
        if self.is_log_case() {
            return (e_end / e_begin).ln() / (e_max / e_min).ln();
        }
        self.pow_diff(e_begin, e_end) / self.pow_diff(e_min, e_max)
    }

    /// Inverse CDF on `[e_min, e_max)` for `u` in `[0, 1)`.
    pub fn sample(&self, e_min: f64, e_max: f64, u: f64) -> f64 {
        if self.is_log_case() {
            return e_min * (e_max / e_min).powf(u);
        }
        let p = 1.0 + self.spectral_index;
        let span = (e_max / e_min).ln();
        (e_min.ln() + (u * (p * span).exp_m1()).ln_1p() / p).exp()
    }
}
