//! Curve risk analysis
//!
//! Reads solvency thresholds off the expiry curve: where the strategy breaks
//! even, where equity drops below maintenance (margin call) or initial
//! margin (stop-out), and where the account goes broke.
//!
//! A curve with NaN samples (a leg with no usable price) has no thresholds to
//! read: the summary is flagged invalid and names the unpriced legs.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::margin::MarginTotals;
use crate::core::Leg;
use crate::payoff::PayoffCurve;

/// Risk points of a strategy at expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSummary {
    /// False when the curve has NaN samples; the price thresholds below are
    /// then meaningless
    pub valid: bool,
    /// Active legs without a usable trade price
    pub unpriced_legs: Vec<String>,
    /// Grid prices where the expiry P/L changes sign
    pub breakevens: Vec<f64>,
    /// Expiry P/L at the left edge of the grid
    pub y_intercept: f64,
    pub total_initial_margin: f64,
    pub total_maintenance_margin: f64,
    /// Lowest grid price whose equity is below total maintenance margin
    pub margin_call_price: Option<f64>,
    /// Lowest grid price whose equity is below total initial margin
    pub stop_out_price: Option<f64>,
    /// Grid prices where equity changes sign
    pub broke_points: Vec<f64>,
    pub max_profit: Option<f64>,
    pub max_loss: Option<f64>,
}

impl RiskSummary {
    pub fn analyze(curve: &PayoffCurve, legs: &[Leg], initial_balance: f64) -> Self {
        let margin = MarginTotals::from_legs(legs);
        let equity = equity_curve(curve, initial_balance);

        let summary = Self {
            valid: curve.is_valid(),
            unpriced_legs: unpriced_legs(legs),
            breakevens: sign_changes(&curve.prices, &curve.pnl_at_expiry),
            y_intercept: curve.pnl_at_expiry.first().copied().unwrap_or(f64::NAN),
            total_initial_margin: margin.initial,
            total_maintenance_margin: margin.maintenance,
            margin_call_price: first_below(&curve.prices, &equity, margin.maintenance),
            stop_out_price: first_below(&curve.prices, &equity, margin.initial),
            broke_points: sign_changes(&curve.prices, &equity),
            max_profit: curve.max_profit().map(|(_, v)| v),
            max_loss: curve.max_loss().map(|(_, v)| v),
        };

        if !summary.valid {
            tracing::warn!(
                "No valid curve, missing price for: {}",
                summary.unpriced_legs.join(", ")
            );
        }
        if let Some(price) = summary.stop_out_price {
            tracing::warn!("Stop-out risk below {:.2}", price);
        }

        summary
    }
}

/// Series of active legs whose trade price is NaN
pub fn unpriced_legs(legs: &[Leg]) -> Vec<String> {
    legs.iter()
        .filter(|l| l.is_active() && l.trade_price.is_nan())
        .map(|l| l.series.clone())
        .collect()
}

/// Account equity at expiry for every grid price
pub fn equity_curve(curve: &PayoffCurve, initial_balance: f64) -> Array1<f64> {
    curve.pnl_at_expiry.mapv(|pnl| initial_balance + pnl)
}

/// Prices where `values` changes sign between consecutive samples.
///
/// The left sample of a crossing is reported. A sample that is exactly zero
/// is reported once, on entry into the zero run. NaN samples never cross.
pub fn sign_changes(prices: &Array1<f64>, values: &Array1<f64>) -> Vec<f64> {
    let n = prices.len().min(values.len());
    let mut out = Vec::new();

    for i in 0..n {
        let v = values[i];
        if v.is_nan() {
            continue;
        }
        if v == 0.0 {
            let entering = i == 0 || values[i - 1] != 0.0;
            if entering {
                out.push(prices[i]);
            }
            continue;
        }
        if i + 1 < n {
            let next = values[i + 1];
            if !next.is_nan() && next != 0.0 && v.signum() != next.signum() {
                out.push(prices[i]);
            }
        }
    }

    out
}

/// Lowest price whose value is strictly below `threshold`
pub fn first_below(prices: &Array1<f64>, values: &Array1<f64>, threshold: f64) -> Option<f64> {
    prices
        .iter()
        .zip(values.iter())
        .filter(|&(_, &v)| v < threshold)
        .map(|(&p, _)| p)
        .fold(None, |min: Option<f64>, p| Some(min.map_or(p, |m| m.min(p))))
}
