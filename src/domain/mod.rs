//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - sky directions and pointing records (`SkyDir`, `PointingRecord`)
//! - the mission reference epoch (`MissionEpoch`)
//! - per-tool run configurations (`SelectConfig`, `DrmConfig`, ...)

pub mod epoch;
pub mod types;

pub use epoch::*;
pub use types::*;
