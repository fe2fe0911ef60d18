//! Roster Core - shared infrastructure for the roster workspace
//!
//! Provides the error types, configuration loading, and logging setup used by
//! every other roster crate.

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
pub use logging::*;
