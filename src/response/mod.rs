//! Detector response matrices from simulated events.

pub mod builder;

pub use builder::*;
