//! Shared configuration and observability for Perseus

pub mod config;
pub mod observability;

pub use self::config::*;
pub use observability::*;
