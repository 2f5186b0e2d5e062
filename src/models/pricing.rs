//! Scenario pricing of strategy legs
//!
//! A scenario fixes everything that is not a property of the leg itself:
//! valuation date, risk-free rate, a volatility shift, a time scale and the
//! optional manual spot used to centre the price grid.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::black_scholes::theoretical_value;
use crate::core::{Leg, StrategyError, StrategyResult};

/// Time to expiry assumed for legs whose expiry could not be decoded (years)
pub const DEFAULT_TIME_TO_EXPIRY: f64 = 0.25;

/// Floor applied to shifted volatility
pub const MIN_VOL: f64 = 1e-6;

/// Default number of grid samples
pub const DEFAULT_GRID_SIZE: usize = 401;

/// Largest grid the curve engine will sample
pub const MAX_GRID_SIZE: usize = 100_000;

/// User-adjustable valuation scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioParams {
    /// Centre the grid on this underlying price instead of the legs' strikes
    pub manual_spot: Option<f64>,
    /// Relative volatility shift in percent (+10 = vol × 1.1)
    pub vol_shift_pct: f64,
    /// Multiplier applied to every leg's time to expiry
    pub time_scale: f64,
    /// Continuously compounded risk-free rate
    pub risk_free_rate: f64,
    /// Number of grid samples
    pub grid_size: usize,
    /// Date the curve is valued at
    pub valuation_date: NaiveDate,
}

impl ScenarioParams {
    pub fn new(valuation_date: NaiveDate) -> Self {
        Self {
            manual_spot: None,
            vol_shift_pct: 0.0,
            time_scale: 1.0,
            risk_free_rate: 0.015,
            grid_size: DEFAULT_GRID_SIZE,
            valuation_date,
        }
    }

    pub fn with_spot(mut self, spot: f64) -> Self {
        self.manual_spot = Some(spot);
        self
    }

    pub fn with_vol_shift(mut self, pct: f64) -> Self {
        self.vol_shift_pct = pct;
        self
    }

    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale;
        self
    }

    pub fn with_grid_size(mut self, n: usize) -> Self {
        self.grid_size = n;
        self
    }

    /// Reject scenarios the curve engine cannot evaluate
    pub fn validate(&self) -> StrategyResult<()> {
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(StrategyError::invalid_input(format!(
                "time scale must be positive, got {}",
                self.time_scale
            )));
        }
        if self.grid_size < 2 {
            return Err(StrategyError::invalid_input(format!(
                "grid needs at least 2 samples, got {}",
                self.grid_size
            )));
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(StrategyError::invalid_input(format!(
                "grid is limited to {} samples, got {}",
                MAX_GRID_SIZE, self.grid_size
            )));
        }
        if !self.risk_free_rate.is_finite() || !self.vol_shift_pct.is_finite() {
            return Err(StrategyError::invalid_input(
                "risk-free rate and volatility shift must be finite",
            ));
        }
        if let Some(spot) = self.manual_spot {
            if !spot.is_finite() || spot <= 0.0 {
                return Err(StrategyError::invalid_input(format!(
                    "manual spot must be positive, got {}",
                    spot
                )));
            }
        }
        Ok(())
    }
}

/// Time to expiry for a leg under the scenario's time scale
pub fn leg_time_to_expiry(leg: &Leg, params: &ScenarioParams) -> f64 {
    let base = match &leg.expiry {
        Some(expiry) => expiry.time_to_expiry(params.valuation_date),
        None => DEFAULT_TIME_TO_EXPIRY,
    };
    base * params.time_scale
}

/// Decimal volatility from a quoted IV in percent, after the scenario shift.
///
/// A missing or zero IV yields NaN so pricing falls back to intrinsic.
pub fn shifted_vol(iv_pct: Option<f64>, vol_shift_pct: f64) -> f64 {
    match iv_pct {
        Some(iv) if iv != 0.0 && iv.is_finite() => {
            (iv / 100.0 * (1.0 + vol_shift_pct / 100.0)).max(MIN_VOL)
        }
        _ => f64::NAN,
    }
}

/// P/L of one leg if the underlying settles at `spot`.
///
/// Inactive legs (placeholders, zero quantity) contribute nothing.
pub fn leg_value_at_expiry(leg: &Leg, spot: f64) -> f64 {
    let Some(kind) = leg.kind.filter(|_| leg.qty != 0) else {
        return 0.0;
    };
    let strike = leg.strike.unwrap_or(0.0);
    (kind.intrinsic(spot, strike) - leg.trade_price) * leg.qty as f64 * leg.multiplier
}

/// P/L of one leg at `spot` on the valuation date, marked to the model
pub fn leg_value_before_expiry(leg: &Leg, spot: f64, params: &ScenarioParams) -> f64 {
    let Some(kind) = leg.kind.filter(|_| leg.qty != 0) else {
        return 0.0;
    };
    let strike = leg.strike.unwrap_or(0.0);
    let time = leg_time_to_expiry(leg, params);
    let vol = shifted_vol(leg.implied_vol, params.vol_shift_pct);
    let value = theoretical_value(kind, spot, strike, time, params.risk_free_rate, vol);
    (value - leg.trade_price) * leg.qty as f64 * leg.multiplier
}
