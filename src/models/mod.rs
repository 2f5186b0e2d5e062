//! Pricing Models
//!
//! Implements:
//! - Black-Scholes (theoretical value of European options, futures linear)
//! - Scenario pricing of individual legs (time scale, vol shift, rate)

pub mod black_scholes;
pub mod pricing;

pub use black_scholes::*;
pub use pricing::*;
