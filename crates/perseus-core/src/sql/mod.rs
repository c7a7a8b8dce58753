//! Visual SQL transformation builder

pub mod chain;
pub mod function;
mod helpers;

pub use chain::*;
pub use function::*;
