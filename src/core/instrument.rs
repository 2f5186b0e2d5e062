//! Instrument definitions
//!
//! Represents the contracts a strategy can hold: European calls and puts
//! and the linear future on the same underlying.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Contract kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    Call,
    Put,
    Future,
}

impl InstrumentKind {
    /// Value if settled at the given underlying price.
    ///
    /// A future has no optionality: its "intrinsic" value is the underlying
    /// itself, so `(intrinsic - entry) * qty` is the usual linear P/L.
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            InstrumentKind::Call => (spot - strike).max(0.0),
            InstrumentKind::Put => (strike - spot).max(0.0),
            InstrumentKind::Future => spot,
        }
    }

    pub fn is_option(&self) -> bool {
        !matches!(self, InstrumentKind::Future)
    }

    pub fn label(&self) -> &'static str {
        match self {
            InstrumentKind::Call => "Call",
            InstrumentKind::Put => "Put",
            InstrumentKind::Future => "Future",
        }
    }
}

impl std::fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Contract expiry decoded from a month code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiry {
    /// Month letter + 2-digit year, e.g. "Z25"
    pub code: String,
    /// Monotonic sort key: position in the month cycle + year * 12
    pub index: i32,
    /// Last trading day
    pub date: NaiveDate,
}

impl Expiry {
    /// Time to expiry in years from the given date, floored at zero
    pub fn time_to_expiry(&self, from: NaiveDate) -> f64 {
        let days = (self.date - from).num_days();
        (days as f64 / 365.0).max(0.0)
    }
}

/// Immutable contract terms decoded from an exchange symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Exchange symbol as quoted
    pub symbol: String,
    /// Call, put or future
    pub kind: InstrumentKind,
    /// Strike price (absent for futures)
    pub strike: Option<f64>,
    /// Expiry terms
    pub expiry: Expiry,
}

impl Instrument {
    /// Time to expiry in years from given date
    pub fn time_to_expiry(&self, from: NaiveDate) -> f64 {
        self.expiry.time_to_expiry(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic() {
        assert_eq!(InstrumentKind::Call.intrinsic(910.0, 900.0), 10.0);
        assert_eq!(InstrumentKind::Put.intrinsic(890.0, 900.0), 10.0);
        assert_eq!(InstrumentKind::Call.intrinsic(890.0, 900.0), 0.0);
        assert_eq!(InstrumentKind::Future.intrinsic(905.5, 0.0), 905.5);
    }

    #[test]
    fn test_time_to_expiry() {
        let expiry = Expiry {
            code: "Z25".to_string(),
            index: 311,
            date: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
        };
        let from = NaiveDate::from_ymd_opt(2025, 9, 20).unwrap();
        assert!((expiry.time_to_expiry(from) - 90.0 / 365.0).abs() < 1e-12);

        // Past expiry floors at zero
        let later = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(expiry.time_to_expiry(later), 0.0);
    }
}
