//! Core of the Perseus mapping UI: the visual SQL transformation builder,
//! row link tracking for mapping panels and the scan dialog forms.

pub mod error;
pub mod mapping;
pub mod notify;
pub mod scan;
pub mod sql;
pub mod telemetry;

pub use error::*;
pub use notify::*;
pub use sql::*;
