//! `perseus`: convenience façade that re-exports `perseus-core`.

#![deny(missing_docs)]

/// Re-export **everything** from perseus-core at the crate root, so users can `use perseus::*;`.
#[doc(inline)]
pub use perseus_core::*;

pub use perseus_core::mapping::{Area, Bridge, Connection, PanelTable, Row, RowRef, Table};
pub use perseus_core::scan::{CdmForm, DbSettings, DqdConsole};

/// Also expose perseus-core as a nested module for `perseus::core::...` paths.
pub use perseus_core as core;
