//! Input/output helpers.
//!
//! - sequential table sources and pointing-table loading (`table`)
//! - accepted-event CSV sink (`events`)
//! - GTI JSON read/write (`gti`)
//! - response-matrix JSON read/write (`response`)
//! - batch manifests (`manifest`)
//! - TJD GTI list import (`tjd`)

pub mod events;
pub mod gti;
pub mod manifest;
pub mod response;
pub mod table;
pub mod tjd;

pub use events::*;
pub use gti::*;
pub use manifest::*;
pub use response::*;
pub use table::*;
pub use tjd::*;
