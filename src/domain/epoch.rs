//! Mission-elapsed-time reference epoch.
//!
//! Absolute dates are converted to MET relative to an explicit [`MissionEpoch`]
//! value handed to whoever needs it; there is no process-wide epoch.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// MJD of 2001-01-01T00:00:00 UTC.
pub const DEFAULT_MJDREF: f64 = 51910.0;

/// Environment variable overriding [`DEFAULT_MJDREF`].
pub const MJDREF_ENV: &str = "MISSION_MJDREF";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Offset between Truncated Julian Day and Modified Julian Day.
const TJD_TO_MJD: f64 = 40_000.0;

/// Reference epoch: MET zero is at MJD `mjdref`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissionEpoch {
    pub mjdref: f64,
}

impl Default for MissionEpoch {
    fn default() -> Self {
        Self {
            mjdref: DEFAULT_MJDREF,
        }
    }
}

impl MissionEpoch {
    pub fn new(mjdref: f64) -> Self {
        Self { mjdref }
    }

    /// Read `MISSION_MJDREF` from the environment (and `.env` if present),
    /// falling back to [`DEFAULT_MJDREF`].
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        match std::env::var(MJDREF_ENV) {
            Ok(raw) => {
                let mjdref: f64 = raw.trim().parse().map_err(|_| {
                    AppError::new(2, format!("Invalid {MJDREF_ENV}='{raw}' (expected a number)."))
                })?;
                if !mjdref.is_finite() {
                    return Err(AppError::new(2, format!("{MJDREF_ENV} must be finite.")));
                }
                Ok(Self::new(mjdref))
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn met_from_mjd(&self, mjd: f64) -> f64 {
        (mjd - self.mjdref) * SECONDS_PER_DAY
    }

    pub fn met_from_tjd(&self, tjd: f64) -> f64 {
        self.met_from_mjd(tjd + TJD_TO_MJD)
    }

    /// MET for a UTC timestamp. Leap seconds are not accounted for.
    pub fn met_from_datetime(&self, dt: NaiveDateTime) -> f64 {
        let mjd_zero = NaiveDate::from_ymd_opt(1858, 11, 17)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        let delta = dt - mjd_zero;
        let seconds = delta
            .num_microseconds()
            .map(|us| us as f64 / 1e6)
            .unwrap_or_else(|| delta.num_seconds() as f64);
        seconds - self.mjdref * SECONDS_PER_DAY
    }
}
