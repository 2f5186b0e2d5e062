//! Underlying price grid
//!
//! Evenly spaced underlying prices the payoff curve is sampled on.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::core::{Leg, StrategyError, StrategyResult};

/// Lowest price a grid may start at
pub const GRID_FLOOR: f64 = 0.1;
/// Lower span factor applied to the smallest reference level
pub const LOWER_SPAN: f64 = 0.6;
/// Upper span factor applied to the largest reference level
pub const UPPER_SPAN: f64 = 1.6;
/// Centre used when neither a spot nor any reference level is known
pub const FALLBACK_CENTRE: f64 = 1000.0;
/// Minimum half-width of a spot-centred grid
pub const MIN_HALF_WIDTH: f64 = 50.0;

/// Evenly spaced underlying prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceGrid {
    pub prices: Array1<f64>,
}

impl PriceGrid {
    /// `n` evenly spaced samples over `[lo, hi]`, endpoints included
    pub fn linspace(lo: f64, hi: f64, n: usize) -> StrategyResult<Self> {
        if n < 2 {
            return Err(StrategyError::invalid_input(format!(
                "grid needs at least 2 samples, got {}",
                n
            )));
        }
        if !lo.is_finite() || !hi.is_finite() || hi <= lo {
            return Err(StrategyError::invalid_input(format!(
                "invalid grid bounds [{}, {}]",
                lo, hi
            )));
        }
        Ok(Self {
            prices: Array1::linspace(lo, hi, n),
        })
    }

    /// Span `[max(0.1, min×0.6), max×1.6]` over the given reference levels
    pub fn from_levels(levels: &[f64], n: usize) -> StrategyResult<Self> {
        let finite = levels.iter().copied().filter(|x| x.is_finite());
        let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
        if lo > hi {
            return Err(StrategyError::invalid_input("no finite reference levels"));
        }
        Self::linspace((lo * LOWER_SPAN).max(GRID_FLOOR), hi * UPPER_SPAN, n)
    }

    /// Span `spot ± max(0.4×spot, 50)`, floored at 0.1
    pub fn centered(spot: f64, n: usize) -> StrategyResult<Self> {
        let half_width = (0.4 * spot).max(MIN_HALF_WIDTH);
        Self::linspace((spot - half_width).max(GRID_FLOOR), spot + half_width, n)
    }

    /// Grid for a set of legs: manual spot first, then the legs' reference
    /// levels, then the fallback centre
    pub fn for_legs(legs: &[Leg], manual_spot: Option<f64>, n: usize) -> StrategyResult<Self> {
        if let Some(spot) = manual_spot {
            return Self::centered(spot, n);
        }

        let levels: Vec<f64> = legs.iter().filter_map(Leg::reference_level).collect();
        if levels.is_empty() {
            Self::from_levels(&[FALLBACK_CENTRE], n)
        } else {
            Self::from_levels(&levels, n)
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.prices.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.prices.last().copied()
    }
}
