//! Snapshot data loading
//!
//! Handles:
//! - Option and futures quote files (exchange JSON exports)
//! - Option and futures margin tables

pub mod snapshot;

pub use snapshot::*;
