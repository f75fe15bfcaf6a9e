//! Forward-only cursors over time-ordered tables.
//!
//! - generic advance-while cursor (`forward`)
//! - pointing table + boresight resolution (`pointing`)

pub mod forward;
pub mod pointing;

pub use forward::*;
pub use pointing::*;
