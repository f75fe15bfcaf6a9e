//! Mathematical utilities: binning, sky geometry, and power-law weights.

pub mod binner;
pub mod powerlaw;
pub mod sphere;

pub use binner::*;
pub use powerlaw::*;
pub use sphere::*;
