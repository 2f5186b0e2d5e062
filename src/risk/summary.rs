//! Strategy summary statistics and what-if estimate

use serde::{Deserialize, Serialize};

use crate::core::{nan_skipping_sum, InstrumentKind, Leg};
use crate::payoff::PayoffCurve;

/// Per-contract, one-way exchange fees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub option_fee: f64,
    pub future_fee: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            option_fee: 81.427,
            future_fee: 83.567,
        }
    }
}

impl FeeSchedule {
    /// Open and close fees for the given contract counts
    pub fn round_trip(&self, option_contracts: u64, future_contracts: u64) -> f64 {
        (self.option_fee * option_contracts as f64 + self.future_fee * future_contracts as f64)
            * 2.0
    }
}

/// Position-level totals shown next to the payoff curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySummary {
    /// Σ |qty| over call and put legs
    pub option_contracts: u64,
    /// Σ |qty| over future legs
    pub future_contracts: u64,
    /// Σ premium over legs with a price; NaN only when no leg has one
    pub net_premium: f64,
    /// Estimated round-trip fees
    pub fees: f64,
}

impl StrategySummary {
    pub fn compute(legs: &[Leg], fees: &FeeSchedule) -> Self {
        let mut option_contracts = 0u64;
        let mut future_contracts = 0u64;
        for leg in legs {
            match leg.kind {
                Some(InstrumentKind::Future) => future_contracts += leg.qty.unsigned_abs(),
                Some(_) => option_contracts += leg.qty.unsigned_abs(),
                None => {}
            }
        }

        let net_premium = nan_skipping_sum(
            legs.iter()
                .filter(|l| l.kind.is_some())
                .map(|l| l.premium_total),
        );

        Self {
            option_contracts,
            future_contracts,
            net_premium,
            fees: fees.round_trip(option_contracts, future_contracts),
        }
    }
}

/// Outcome if the underlying settles at a user-estimated price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIf {
    pub estimate_price: f64,
    /// Expiry P/L interpolated from the curve, clamped at the grid edges
    pub pnl: f64,
    /// Initial balance plus P/L
    pub equity: f64,
    /// Equity below the strategy's total initial margin
    pub below_initial_margin: bool,
}

impl WhatIf {
    pub fn evaluate(
        curve: &PayoffCurve,
        estimate_price: f64,
        initial_balance: f64,
        total_initial_margin: f64,
    ) -> Self {
        let pnl = curve.pnl_at_expiry_interp(estimate_price);
        let equity = initial_balance + pnl;
        Self {
            estimate_price,
            pnl,
            equity,
            below_initial_margin: equity < total_initial_margin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScenarioParams;
    use crate::payoff::PriceGrid;
    use chrono::NaiveDate;

    #[test]
    fn test_summary_counts_and_fees() {
        let legs = vec![
            Leg::option("S50Z25C900", InstrumentKind::Call, 900.0, None, -2, 20.0, 200.0),
            Leg::option("S50Z25P850", InstrumentKind::Put, 850.0, None, 3, 10.0, 200.0),
            Leg::future("S50Z25", None, -1, 905.0, 200.0),
            Leg::placeholder("Missing Call"),
        ];
        let summary = StrategySummary::compute(&legs, &FeeSchedule::default());

        assert_eq!(summary.option_contracts, 5);
        assert_eq!(summary.future_contracts, 1);
        assert_eq!(summary.net_premium, -8000.0 + 6000.0);
        assert!((summary.fees - (81.427 * 5.0 + 83.567) * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_net_premium_skips_missing_prices() {
        let mut legs = vec![
            Leg::option("S50Z25C900", InstrumentKind::Call, 900.0, None, 1, 20.0, 200.0),
            Leg::option("S50Z25P900", InstrumentKind::Put, 900.0, None, 1, f64::NAN, 200.0),
        ];
        let summary = StrategySummary::compute(&legs, &FeeSchedule::default());
        assert_eq!(summary.net_premium, 4000.0);

        legs[0].set_trade_price(f64::NAN);
        let summary = StrategySummary::compute(&legs, &FeeSchedule::default());
        assert!(summary.net_premium.is_nan());
    }

    #[test]
    fn test_what_if() {
        let legs = vec![Leg::future("S50Z25", None, 1, 900.0, 200.0)];
        let scenario = ScenarioParams::new(NaiveDate::from_ymd_opt(2025, 9, 20).unwrap());
        let grid = PriceGrid::linspace(800.0, 1000.0, 3).unwrap();
        let curve = PayoffCurve::on_grid(&legs, &grid, &scenario).unwrap();

        let inside = WhatIf::evaluate(&curve, 850.0, 50_000.0, 30_000.0);
        assert_eq!(inside.pnl, -10_000.0);
        assert_eq!(inside.equity, 40_000.0);
        assert!(!inside.below_initial_margin);

        // Outside the grid the edge value is held
        let clamped = WhatIf::evaluate(&curve, 700.0, 50_000.0, 35_000.0);
        assert_eq!(clamped.pnl, -20_000.0);
        assert_eq!(clamped.equity, 30_000.0);
        assert!(clamped.below_initial_margin);
    }
}
