//! Margin aggregation
//!
//! Exchange margin is posted per contract on short positions. Long legs are
//! fully paid for by their premium and post nothing.

use serde::{Deserialize, Serialize};

use crate::core::Leg;

/// Strategy-level initial and maintenance margin
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginTotals {
    pub initial: f64,
    pub maintenance: f64,
}

impl MarginTotals {
    /// Σ |qty| × per-contract margin over short legs; absent margins count as 0
    pub fn from_legs(legs: &[Leg]) -> Self {
        legs.iter().fold(Self::default(), |acc, leg| {
            let contracts = leg.qty.unsigned_abs() as f64;
            Self {
                initial: acc.initial + contracts * leg.effective_initial_margin(),
                maintenance: acc.maintenance + contracts * leg.effective_maintenance_margin(),
            }
        })
    }
}
