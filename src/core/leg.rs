//! Strategy legs
//!
//! A leg is one series held with a signed quantity (positive = long) at a
//! trade price. Legs carry their contract multiplier so premium and P/L are
//! always computed in money terms.

use serde::{Deserialize, Serialize};

use super::error::{StrategyError, StrategyResult};
use super::instrument::{Expiry, InstrumentKind};
use super::quote::{MarginRecord, Quote};
use super::symbol;

/// A configured position in one series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    /// Exchange series symbol (or a description for placeholders)
    pub series: String,
    /// Contract kind; `None` marks an unresolved template placeholder
    pub kind: Option<InstrumentKind>,
    /// Strike price (options only)
    pub strike: Option<f64>,
    /// Expiry terms, absent when the symbol could not be decoded
    pub expiry: Option<Expiry>,
    /// Signed quantity in contracts
    pub qty: i64,
    /// Entry price per unit; NaN when no usable price exists
    pub trade_price: f64,
    /// Contract multiplier
    pub multiplier: f64,
    /// trade_price * qty * multiplier (zero for futures)
    pub premium_total: f64,
    /// Quoted implied volatility in percent
    pub implied_vol: Option<f64>,
    /// Per-contract initial margin as published
    pub initial_margin: Option<f64>,
    /// Per-contract maintenance margin as published
    pub maintenance_margin: Option<f64>,
    pub theoretical: Option<f64>,
    pub intrinsic_value: Option<f64>,
    pub moneyness: Option<String>,
    pub days_left: Option<f64>,
}

impl Leg {
    fn base(series: impl Into<String>, kind: Option<InstrumentKind>, multiplier: f64) -> Self {
        Self {
            series: series.into(),
            kind,
            strike: None,
            expiry: None,
            qty: 0,
            trade_price: f64::NAN,
            multiplier,
            premium_total: 0.0,
            implied_vol: None,
            initial_margin: None,
            maintenance_margin: None,
            theoretical: None,
            intrinsic_value: None,
            moneyness: None,
            days_left: None,
        }
    }

    /// Option leg from explicit terms
    pub fn option(
        series: impl Into<String>,
        kind: InstrumentKind,
        strike: f64,
        expiry: Option<Expiry>,
        qty: i64,
        trade_price: f64,
        multiplier: f64,
    ) -> Self {
        let mut leg = Self::base(series, Some(kind), multiplier);
        leg.strike = Some(strike);
        leg.expiry = expiry;
        leg.qty = qty;
        leg.trade_price = trade_price;
        leg.refresh_premium();
        leg
    }

    /// Future leg from explicit terms
    pub fn future(
        series: impl Into<String>,
        expiry: Option<Expiry>,
        qty: i64,
        trade_price: f64,
        multiplier: f64,
    ) -> Self {
        let mut leg = Self::base(series, Some(InstrumentKind::Future), multiplier);
        leg.expiry = expiry;
        leg.qty = qty;
        leg.trade_price = trade_price;
        leg.refresh_premium();
        leg
    }

    /// Zero-quantity row standing in for a template component that could not
    /// be resolved against the market
    pub fn placeholder(description: impl Into<String>) -> Self {
        let mut leg = Self::base(description, None, 0.0);
        leg.trade_price = 0.0;
        leg
    }

    /// Build a leg from a market quote.
    ///
    /// Undecodable symbols never fail the strategy: a missing expiry degrades
    /// to `None`, and a symbol whose kind/strike cannot be read yields an
    /// inactive leg that is carried but priced at nothing. A price override
    /// replaces the resolved price only when strictly positive.
    pub fn from_quote(
        quote: &Quote,
        qty: i64,
        price_override: Option<f64>,
        margin: Option<&MarginRecord>,
        multiplier: f64,
    ) -> Self {
        let (kind, strike) = match symbol::parse_kind_and_strike(&quote.series) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("Series {} is not a contract, leg left inactive: {}", quote.series, e);
                let mut leg = Self::base(&quote.series, None, multiplier);
                leg.qty = qty;
                return leg;
            }
        };

        let expiry = match symbol::parse_expiry(&quote.series) {
            Ok(mut expiry) => {
                if let Some(date) = quote.expiry_date {
                    expiry.date = date;
                }
                Some(expiry)
            }
            Err(e) => {
                tracing::warn!("Series {} has no decodable expiry: {}", quote.series, e);
                None
            }
        };

        let trade_price = match price_override {
            Some(p) if p > 0.0 => p,
            _ => quote.resolve_price(),
        };

        let mut leg = Self::base(&quote.series, Some(kind), multiplier);
        leg.strike = strike;
        leg.expiry = expiry;
        leg.qty = qty;
        leg.trade_price = trade_price;
        leg.implied_vol = quote.implied_vol;
        leg.theoretical = quote.theoretical;
        leg.intrinsic_value = quote.intrinsic_value;
        leg.moneyness = quote.moneyness.clone();
        leg.days_left = quote.days_left;
        if let Some(m) = margin {
            leg.initial_margin = m.initial;
            leg.maintenance_margin = m.maintenance;
        }
        leg.refresh_premium();

        leg
    }

    pub fn with_implied_vol(mut self, iv_pct: f64) -> Self {
        self.implied_vol = Some(iv_pct);
        self
    }

    pub fn with_margin(mut self, initial: f64, maintenance: f64) -> Self {
        self.initial_margin = Some(initial);
        self.maintenance_margin = Some(maintenance);
        self
    }

    /// Change the quantity, keeping the premium in sync
    pub fn set_qty(&mut self, qty: i64) {
        self.qty = qty;
        self.refresh_premium();
    }

    /// Change the trade price, keeping the premium in sync
    pub fn set_trade_price(&mut self, price: f64) {
        self.trade_price = price;
        self.refresh_premium();
    }

    fn refresh_premium(&mut self) {
        self.premium_total = match self.kind {
            Some(kind) if kind.is_option() => self.trade_price * self.qty as f64 * self.multiplier,
            _ => 0.0,
        };
    }

    /// Contributes to P/L: resolved kind and non-zero quantity
    pub fn is_active(&self) -> bool {
        self.kind.is_some() && self.qty != 0
    }

    pub fn is_long(&self) -> bool {
        self.qty > 0
    }

    /// Price level used to place the leg on the strike axis.
    ///
    /// Options use their strike; futures use their entry price.
    pub fn reference_level(&self) -> Option<f64> {
        let level = match self.kind? {
            InstrumentKind::Future => Some(self.trade_price),
            _ => self.strike,
        };
        level.filter(|x| x.is_finite())
    }

    pub fn expiry_index(&self) -> Option<i32> {
        self.expiry.as_ref().map(|e| e.index)
    }

    /// Entry price, or `MissingPrice` when no usable price was resolved
    pub fn require_price(&self) -> StrategyResult<f64> {
        if self.trade_price.is_nan() {
            Err(StrategyError::missing_price(format!(
                "no usable price for {}",
                self.series
            )))
        } else {
            Ok(self.trade_price)
        }
    }

    /// Initial margin per contract; long legs post none
    pub fn effective_initial_margin(&self) -> f64 {
        if self.is_long() {
            0.0
        } else {
            self.initial_margin.unwrap_or(0.0)
        }
    }

    /// Maintenance margin per contract; long legs post none
    pub fn effective_maintenance_margin(&self) -> f64 {
        if self.is_long() {
            0.0
        } else {
            self.maintenance_margin.unwrap_or(0.0)
        }
    }
}
