//! Strategy Pattern Recognition
//!
//! Names a set of legs by comparing its shape against a library of
//! strategy templates (straddle, iron condor, ...).
//!
//! Shapes are compared in offset space, never in absolute prices:
//! 1. **Actual pattern**: each leg becomes (kind, side, strike offset, expiry offset)
//!    relative to the ATM strike and the modal expiry
//! 2. **Normalization**: both patterns are shifted so the nearest expiry is 0
//! 3. **Permutation search**: lowest total offset distance over all leg pairings
//!
//! Templates can also be instantiated against a market snapshot, producing
//! concrete legs that match their own template with score 0.

mod builder;
mod config;
mod detection;
mod detector;
mod library;

pub use builder::*;
pub use config::*;
pub use detection::*;
pub use detector::*;
pub use library::*;

use serde::{Deserialize, Serialize};

use crate::core::InstrumentKind;

/// One leg of a strategy template, in offset space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateComponent {
    /// Contract kind
    #[serde(rename = "type")]
    pub kind: InstrumentKind,
    /// Default quantity; its sign selects long or short
    #[serde(default)]
    pub qty: i64,
    /// Strike steps away from ATM
    #[serde(default)]
    pub relative_strike: i64,
    /// Expiry months away from the reference expiry
    #[serde(default)]
    pub relative_expiry: i64,
}

impl TemplateComponent {
    pub fn new(kind: InstrumentKind, qty: i64, relative_strike: i64, relative_expiry: i64) -> Self {
        Self {
            kind,
            qty,
            relative_strike,
            relative_expiry,
        }
    }

    pub fn pattern_leg(&self) -> PatternLeg {
        PatternLeg {
            kind: self.kind,
            side: self.qty.signum(),
            relative_strike: self.relative_strike,
            relative_expiry: self.relative_expiry,
        }
    }

    /// Label for a placeholder leg standing in for this component
    pub fn missing_label(&self) -> String {
        format!(
            "Missing {} (rs={}, re={})",
            self.kind, self.relative_strike, self.relative_expiry
        )
    }
}

/// Named template with display metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyTemplate {
    pub name: String,
    pub components: Vec<TemplateComponent>,
    /// One-line hint shown with a detected strategy
    #[serde(default)]
    pub tip: String,
    #[serde(default)]
    pub description: String,
    /// Family, e.g. "Volatility" or "Spread"
    #[serde(default)]
    pub group: String,
}

impl StrategyTemplate {
    pub fn new(name: impl Into<String>, components: Vec<TemplateComponent>) -> Self {
        Self {
            name: name.into(),
            components,
            tip: String::new(),
            description: String::new(),
            group: String::new(),
        }
    }

    pub fn pattern(&self) -> Vec<PatternLeg> {
        self.components.iter().map(TemplateComponent::pattern_leg).collect()
    }
}

/// A leg reduced to its shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternLeg {
    pub kind: InstrumentKind,
    /// -1 short, 0 flat, +1 long
    pub side: i64,
    pub relative_strike: i64,
    pub relative_expiry: i64,
}

impl PatternLeg {
    /// Pairing cost against another leg, `None` when kind or side differ or
    /// the offsets are too far apart to score
    pub fn distance(&self, other: &PatternLeg) -> Option<u64> {
        if self.kind != other.kind || self.side != other.side {
            return None;
        }
        self.relative_strike
            .abs_diff(other.relative_strike)
            .checked_add(self.relative_expiry.abs_diff(other.relative_expiry))
    }
}

/// Best template for a set of legs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub name: String,
    /// Total offset distance; 0 is an exact shape match
    pub score: u64,
}
