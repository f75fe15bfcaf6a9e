//! Angular separations on the celestial sphere.
//!
//! The pipeline only ever needs "how far apart are these two directions", so
//! geometry sits behind the small [`AngularSeparation`] trait.

use crate::domain::{SeparationKind, SkyDir};

pub trait AngularSeparation {
    /// Separation between `a` and `b` in degrees.
    fn separation_deg(&self, a: SkyDir, b: SkyDir) -> f64;
}

/// Great-circle distance (haversine form, stable for small angles).
pub fn great_circle_deg(a: SkyDir, b: SkyDir) -> f64 {
    let (ra1, dec1) = (a.ra.to_radians(), a.dec.to_radians());
    let (ra2, dec2) = (b.ra.to_radians(), b.dec.to_radians());
    let sin_ddec = ((dec2 - dec1) / 2.0).sin();
    let sin_dra = ((ra2 - ra1) / 2.0).sin();
    let h = sin_ddec * sin_ddec + dec1.cos() * dec2.cos() * sin_dra * sin_dra;
    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

/// Small-angle approximation `sqrt((cos(dec_a)·Δra)² + Δdec²)`, with `Δra`
/// wrapped into `[-180, 180)`.
///
/// This is the offset the 68% containment parameters were tuned against.
pub fn flat_sky_deg(a: SkyDir, b: SkyDir) -> f64 {
    let dra = (a.ra - b.ra + 180.0).rem_euclid(360.0) - 180.0;
    let ddec = a.dec - b.dec;
    ((a.dec.to_radians().cos() * dra).powi(2) + ddec * ddec).sqrt()
}

impl AngularSeparation for SeparationKind {
    fn separation_deg(&self, a: SkyDir, b: SkyDir) -> f64 {
        match self {
            SeparationKind::GreatCircle => great_circle_deg(a, b),
            SeparationKind::FlatSky => flat_sky_deg(a, b),
        }
    }
}
