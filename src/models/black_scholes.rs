//! Black-Scholes Model
//!
//! European call/put pricing used for the before-expiry payoff curve.
//! Degenerate inputs (no time left, no volatility, unknown volatility)
//! collapse to intrinsic value so a leg without a usable IV still has a
//! well-defined curve.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::core::InstrumentKind;

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Black-Scholes d1 parameter
pub fn d1(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    ((spot / strike).ln() + (rate + 0.5 * vol * vol) * time) / (vol * time.sqrt())
}

/// Black-Scholes d2 parameter
pub fn d2(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    d1(spot, strike, rate, vol, time) - vol * time.sqrt()
}

/// Black-Scholes European option price.
///
/// Returns intrinsic value when `time <= 0`, `vol <= 0` or `vol` is NaN.
/// Futures are linear and priced at the underlying.
pub fn price(spot: f64, strike: f64, rate: f64, vol: f64, time: f64, kind: InstrumentKind) -> f64 {
    if kind == InstrumentKind::Future {
        return spot;
    }

    if time <= 0.0 || vol.is_nan() || vol <= 0.0 {
        return kind.intrinsic(spot, strike);
    }

    let d1 = d1(spot, strike, rate, vol, time);
    let d2 = d2(spot, strike, rate, vol, time);
    let df = (-rate * time).exp();

    match kind {
        InstrumentKind::Call => spot * norm_cdf(d1) - strike * df * norm_cdf(d2),
        InstrumentKind::Put => strike * df * norm_cdf(-d2) - spot * norm_cdf(-d1),
        InstrumentKind::Future => spot,
    }
}

/// Theoretical value of a leg's contract at underlying `spot`
pub fn theoretical_value(
    kind: InstrumentKind,
    spot: f64,
    strike: f64,
    time: f64,
    rate: f64,
    vol: f64,
) -> f64 {
    price(spot, strike, rate, vol, time, kind)
}
