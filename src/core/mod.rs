//! Core data types for the strategy engine
//!
//! Defines fundamental types:
//! - Instrument: decoded contract terms (kind, strike, expiry)
//! - Quote / MarginRecord: tolerant exchange records
//! - Leg: a configured position in one series

pub mod error;
pub mod instrument;
pub mod leg;
pub mod numeric;
pub mod quote;
pub mod symbol;

pub use error::*;
pub use instrument::*;
pub use leg::*;
pub use numeric::{nan_skipping_sum, parse_num, parse_num_str, parse_opt};
pub use quote::*;
pub use symbol::{decode, ExpiryCode};
