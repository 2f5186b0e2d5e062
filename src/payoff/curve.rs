//! Strategy payoff curve
//!
//! Aggregate P/L of every active leg sampled over a price grid, once at
//! expiry (intrinsic) and once on the valuation date (model value).

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::grid::PriceGrid;
use crate::core::{Leg, StrategyError, StrategyResult};
use crate::models::{leg_value_at_expiry, leg_value_before_expiry, ScenarioParams};

/// Three parallel sequences: grid price, expiry P/L, pre-expiry P/L
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffCurve {
    pub prices: Array1<f64>,
    pub pnl_at_expiry: Array1<f64>,
    pub pnl_before_expiry: Array1<f64>,
}

impl PayoffCurve {
    /// Build the curve over the grid derived from the legs and scenario
    pub fn build(legs: &[Leg], scenario: &ScenarioParams) -> StrategyResult<Self> {
        scenario.validate()?;
        ensure_active(legs)?;
        let grid = PriceGrid::for_legs(legs, scenario.manual_spot, scenario.grid_size)?;
        Self::on_grid(legs, &grid, scenario)
    }

    /// Evaluate the curve on an explicit grid
    pub fn on_grid(legs: &[Leg], grid: &PriceGrid, scenario: &ScenarioParams) -> StrategyResult<Self> {
        ensure_active(legs)?;
        let active: Vec<&Leg> = legs.iter().filter(|l| l.is_active()).collect();

        let pnl_at_expiry = grid
            .prices
            .mapv(|s| active.iter().map(|leg| leg_value_at_expiry(leg, s)).sum::<f64>());
        let pnl_before_expiry = grid.prices.mapv(|s| {
            active
                .iter()
                .map(|leg| leg_value_before_expiry(leg, s, scenario))
                .sum::<f64>()
        });

        Ok(Self {
            prices: grid.prices.clone(),
            pnl_at_expiry,
            pnl_before_expiry,
        })
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// False when a missing trade price has turned any sample into NaN
    pub fn is_valid(&self) -> bool {
        self.pnl_at_expiry.iter().all(|v| !v.is_nan())
            && self.pnl_before_expiry.iter().all(|v| !v.is_nan())
    }

    /// Expiry P/L at an arbitrary price, linear between samples and clamped
    /// to the end values outside the grid
    pub fn pnl_at_expiry_interp(&self, price: f64) -> f64 {
        interp(&self.prices, &self.pnl_at_expiry, price)
    }

    /// (price, P/L) of the best expiry outcome on the grid
    pub fn max_profit(&self) -> Option<(f64, f64)> {
        self.extreme(|candidate, best| candidate > best)
    }

    /// (price, P/L) of the worst expiry outcome on the grid
    pub fn max_loss(&self) -> Option<(f64, f64)> {
        self.extreme(|candidate, best| candidate < best)
    }

    fn extreme(&self, better: impl Fn(f64, f64) -> bool) -> Option<(f64, f64)> {
        self.prices
            .iter()
            .zip(self.pnl_at_expiry.iter())
            .filter(|(_, v)| !v.is_nan())
            .fold(None, |best: Option<(f64, f64)>, (&p, &v)| match best {
                Some((_, b)) if !better(v, b) => best,
                _ => Some((p, v)),
            })
    }
}

fn ensure_active(legs: &[Leg]) -> StrategyResult<()> {
    if legs.is_empty() {
        return Err(StrategyError::degenerate("strategy has no legs"));
    }
    if !legs.iter().any(Leg::is_active) {
        return Err(StrategyError::degenerate(
            "no active leg: every leg has zero quantity or an unknown kind",
        ));
    }
    Ok(())
}

/// Piecewise-linear interpolation over ascending `xs`, clamped at both ends
pub fn interp(xs: &Array1<f64>, ys: &Array1<f64>, x: f64) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 || x.is_nan() {
        return f64::NAN;
    }
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }

    // First sample strictly above x; x > xs[0] guarantees hi >= 1
    let hi = xs.iter().take(n).position(|&v| v > x).unwrap_or(n - 1);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span <= 0.0 {
        return ys[lo];
    }
    let frac = (x - xs[lo]) / span;
    ys[lo] + frac * (ys[hi] - ys[lo])
}
