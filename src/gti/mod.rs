//! Good-time-interval sets and streaming time acceptance.

pub mod interval_set;

pub use interval_set::*;
