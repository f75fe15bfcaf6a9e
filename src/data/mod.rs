//! Synthetic input data.

pub mod sample;

pub use sample::*;
