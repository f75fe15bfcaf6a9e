//! Reporting utilities: formatted terminal summaries for each tool.

pub mod format;

pub use format::*;
