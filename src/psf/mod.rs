//! Energy- and view-angle-dependent PSF containment cut.
//!
//! The 68% containment radius is a broken power law in energy whose
//! parameters switch on the source off-axis angle:
//!
//! ```text
//! r68(E) = N_b · min((E/E_b)^low_slope, (E/E_b)^high_slope)      [deg, E in MeV]
//! ```
//!
//! An event is accepted when its separation from the source is `<= r68(E)`.

use crate::cursor::PointingCursor;
use crate::domain::SkyDir;
use crate::error::CoreError;
use crate::math::{AngularSeparation, great_circle_deg};

/// Off-axis angle (deg) above which the wide-angle parameters apply.
pub const OFF_AXIS_SWITCH_DEG: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Psf68Params {
    pub norm: f64,
    pub break_energy: f64,
    pub low_slope: f64,
    pub high_slope: f64,
}

/// Parameters for sources within 40° of the boresight.
pub const ON_AXIS: Psf68Params = Psf68Params {
    norm: 11.5,
    break_energy: 59.0,
    low_slope: -0.55,
    high_slope: -0.87,
};

/// Parameters for sources more than 40° off the boresight.
pub const OFF_AXIS: Psf68Params = Psf68Params {
    norm: 10.5,
    break_energy: 100.0,
    low_slope: -0.65,
    high_slope: -0.81,
};

impl Psf68Params {
    pub fn for_off_axis(off_axis_deg: f64) -> Self {
        if off_axis_deg > OFF_AXIS_SWITCH_DEG { OFF_AXIS } else { ON_AXIS }
    }

    pub fn radius(&self, energy: f64) -> f64 {
        let x = energy / self.break_energy;
        self.norm * x.powf(self.low_slope).min(x.powf(self.high_slope))
    }
}

/// 68% containment radius (deg) at `energy` (MeV) for a given off-axis angle.
pub fn radius68(energy: f64, off_axis_deg: f64) -> f64 {
    Psf68Params::for_off_axis(off_axis_deg).radius(energy)
}

#[derive(Debug, Clone, Copy)]
struct OffAxisMemo {
    record: usize,
    deg: f64,
}

/// PSF cut that follows the spacecraft pointing through a [`PointingCursor`].
///
/// Events must be fed in non-decreasing time order. The off-axis angle is a
/// step function of the pointing record, so it is recomputed only when the
/// cursor lands on a new record.
pub struct AngularAcceptance<'a, S> {
    cursor: PointingCursor<'a>,
    source: SkyDir,
    separation: S,
    memo: Option<OffAxisMemo>,
    off_axis_updates: usize,
}

impl<'a, S: AngularSeparation> AngularAcceptance<'a, S> {
    pub fn new(cursor: PointingCursor<'a>, source: SkyDir, separation: S) -> Self {
        Self {
            cursor,
            source,
            separation,
            memo: None,
            off_axis_updates: 0,
        }
    }

    /// Accept or reject one event. Coverage errors from the cursor propagate.
    pub fn accept(&mut self, energy: f64, time: f64, event_dir: SkyDir) -> Result<bool, CoreError> {
        let boresight = self.cursor.resolve_boresight(time)?;
        let record = self.cursor.position();

        let off_axis = match self.memo {
            Some(memo) if memo.record == record => memo.deg,
            _ => {
                let deg = great_circle_deg(boresight, self.source);
                self.memo = Some(OffAxisMemo { record, deg });
                self.off_axis_updates += 1;
                deg
            }
        };

        let separation = self.separation.separation_deg(event_dir, self.source);
        Ok(separation <= radius68(energy, off_axis))
    }

    pub fn source(&self) -> SkyDir {
        self.source
    }

    /// Off-axis angle (deg) of the source for the current pointing record.
    pub fn off_axis_deg(&self) -> Option<f64> {
        self.memo.map(|m| m.deg)
    }

    /// How many times the off-axis angle has been recomputed.
    pub fn off_axis_updates(&self) -> usize {
        self.off_axis_updates
    }

    pub fn cursor(&self) -> &PointingCursor<'a> {
        &self.cursor
    }
}

/// PSF cut at a fixed, caller-supplied off-axis angle.
#[derive(Debug, Clone, Copy)]
pub struct StaticAcceptance<S> {
    source: SkyDir,
    params: Psf68Params,
    separation: S,
}

impl<S: AngularSeparation> StaticAcceptance<S> {
    pub fn new(source: SkyDir, off_axis_deg: f64, separation: S) -> Self {
        Self {
            source,
            params: Psf68Params::for_off_axis(off_axis_deg),
            separation,
        }
    }

    pub fn accept(&self, energy: f64, event_dir: SkyDir) -> bool {
        self.separation.separation_deg(event_dir, self.source) <= self.params.radius(energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::PointingTable;
    use crate::domain::{PointingRecord, SeparationKind};

    #[test]
    fn radius_regimes_switch_above_40_degrees() {
        // At the break energy both slopes give x^s = 1.
        assert!((radius68(59.0, 40.0) - 11.5).abs() < 1e-12);
        assert!((radius68(100.0, 40.0001) - 10.5).abs() < 1e-12);
        // Above the break the steeper slope wins the min().
        let e = 1000.0;
        let expected = 11.5 * (e / 59.0f64).powf(-0.87);
        assert!((radius68(e, 10.0) - expected).abs() < 1e-12);
        // Below the break the shallower slope wins.
        let e = 20.0;
        let expected = 10.5 * (e / 100.0f64).powf(-0.65);
        assert!((radius68(e, 60.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn boundary_separation_is_accepted() {
        let source = SkyDir::new(0.0, 0.0);
        let radius = radius68(59.0, 0.0);
        assert_eq!(radius, 11.5);
        let cut = StaticAcceptance::new(source, 0.0, SeparationKind::FlatSky);
        // Pure declination offset: flat-sky separation equals the offset exactly.
        assert!(cut.accept(59.0, SkyDir::new(0.0, 11.5)));
        assert!(!cut.accept(59.0, SkyDir::new(0.0, 11.5 + 1e-9)));
    }

    #[test]
    fn off_axis_recomputed_only_on_record_change() {
        let table = PointingTable::new(vec![
            PointingRecord::new(0.0, 10.0, 0.0, 0.0),
            PointingRecord::new(10.0, 20.0, 0.0, 50.0),
        ])
        .unwrap();
        let source = SkyDir::new(0.0, 1.0);
        let mut cut = AngularAcceptance::new(table.cursor(), source, SeparationKind::GreatCircle);

        for t in [0.5, 1.0, 2.0, 9.9] {
            cut.accept(100.0, t, source).unwrap();
        }
        assert_eq!(cut.off_axis_updates(), 1);
        assert!((cut.off_axis_deg().unwrap() - 1.0).abs() < 1e-9);

        cut.accept(100.0, 10.0, source).unwrap();
        cut.accept(100.0, 15.0, source).unwrap();
        assert_eq!(cut.off_axis_updates(), 2);
        assert!((cut.off_axis_deg().unwrap() - 49.0).abs() < 1e-9);
    }

    #[test]
    fn off_axis_regime_changes_acceptance() {
        let table = PointingTable::new(vec![
            PointingRecord::new(0.0, 10.0, 0.0, 0.0),
            PointingRecord::new(10.0, 20.0, 0.0, 60.0),
        ])
        .unwrap();
        let source = SkyDir::new(0.0, 0.0);
        let mut cut = AngularAcceptance::new(table.cursor(), source, SeparationKind::GreatCircle);
        // At 59 MeV: on-axis radius 11.5, off-axis radius 10.5 * (0.59)^-0.65 ≈ 14.8.
        let event = SkyDir::new(0.0, 12.0);
        assert!(!cut.accept(59.0, 5.0, event).unwrap());
        assert!(cut.accept(59.0, 15.0, event).unwrap());
    }

    #[test]
    fn coverage_errors_propagate() {
        let table = PointingTable::new(vec![PointingRecord::new(0.0, 10.0, 0.0, 0.0)]).unwrap();
        let source = SkyDir::new(0.0, 0.0);
        let mut cut = AngularAcceptance::new(table.cursor(), source, SeparationKind::GreatCircle);
        assert!(matches!(
            cut.accept(100.0, 10.0, source),
            Err(CoreError::Coverage { .. })
        ));
    }
}
