//! Payoff Curve Engine
//!
//! Samples a strategy's aggregate P/L over a grid of underlying prices:
//! - PriceGrid: evenly spaced prices around the legs or a manual spot
//! - PayoffCurve: P/L at expiry and before expiry on that grid

pub mod curve;
pub mod grid;

pub use curve::*;
pub use grid::*;
