//! `event-response` library crate.
//!
//! The binary (`evr`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the interval, cursor, PSF and response components are reusable on their own
//! - code stays easy to navigate as the tool family grows

pub mod app;
pub mod cli;
pub mod cursor;
pub mod data;
pub mod domain;
pub mod error;
pub mod gti;
pub mod io;
pub mod math;
pub mod psf;
pub mod report;
pub mod response;
