//! Risk & Margin Analysis
//!
//! Derives solvency information from a payoff curve and its legs:
//! - MarginTotals: strategy initial / maintenance margin
//! - RiskSummary: breakevens, margin-call and stop-out prices, broke points
//! - StrategySummary / WhatIf: contract counts, premium, fees, estimate P/L

pub mod analysis;
pub mod margin;
pub mod summary;

pub use analysis::*;
pub use margin::*;
pub use summary::*;
