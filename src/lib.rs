//! # Strategy Options - Multi-Leg Strategy Engine
//!
//! A payoff, pattern and margin-risk engine for multi-leg option and futures
//! positions on a single underlying (SET50 index options and futures).
//!
//! ## Overview
//!
//! A strategy is a set of legs, each a signed quantity of one listed series.
//! The engine:
//! - **Decodes** exchange symbols into contract terms (`S50Z25C900`)
//! - **Prices** every leg at expiry (intrinsic) and before expiry (Black-Scholes)
//! - **Aggregates** the legs into a payoff curve over a grid of underlying prices
//! - **Names** the strategy by matching its shape against a template library
//! - **Analyzes** breakevens, margin requirements and the prices at which the
//!   account hits a margin call or a stop-out
//!
//! ## Usage
//!
//! ```rust,no_run
//! use strategy_options::prelude::*;
//!
//! let market = MarketSnapshot::load(&SnapshotPaths::default()).unwrap();
//! let library = TemplateLibrary::from_path("data/st_template.json").unwrap();
//!
//! // Build legs
//! let legs = vec![
//!     market.build_leg("S50Z25C900", 1, None, 200.0).unwrap(),
//!     market.build_leg("S50Z25P900", 1, None, 200.0).unwrap(),
//! ];
//!
//! // Payoff curve valued today
//! let scenario = ScenarioParams::new(chrono::Local::now().date_naive());
//! let curve = PayoffCurve::build(&legs, &scenario).unwrap();
//!
//! // Name it and check solvency
//! let spot = PatternMatcher::detection_spot(None, &legs).unwrap();
//! let pattern = detect(&legs, spot, &library);
//! let risk = RiskSummary::analyze(&curve, &legs, 50_000.0);
//! ```
//!
//! ## What This Engine Does NOT Do
//!
//! - Stream live market data or route orders
//! - Price American early exercise (European Black-Scholes only)
//! - Aggregate risk across several underlyings
//! - Persist strategies or render charts

pub mod config;
pub mod core;
pub mod data;
pub mod models;
pub mod patterns;
pub mod payoff;
pub mod risk;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        decode, parse_num, Expiry, Instrument, InstrumentKind, Leg, MarginRecord, MarginTable,
        Quote, StrategyError, StrategyResult,
    };

    // Configuration
    pub use crate::config::{load_config, EngineConfig};

    // Snapshot loading
    pub use crate::data::{MarketSnapshot, SnapshotPaths};

    // Models
    pub use crate::models::{
        leg_value_at_expiry, leg_value_before_expiry, theoretical_value, ScenarioParams,
    };

    // Payoff
    pub use crate::payoff::{PayoffCurve, PriceGrid};

    // Pattern Matching
    pub use crate::patterns::{
        detect, MatcherConfig, PatternMatch, PatternMatcher, StrategyTemplate, TemplateBuilder,
        TemplateComponent, TemplateInstance, TemplateLibrary,
    };

    // Risk
    pub use crate::risk::{FeeSchedule, MarginTotals, RiskSummary, StrategySummary, WhatIf};
}

// Re-export main types at crate root
pub use crate::core::{StrategyError, StrategyResult};
pub use crate::payoff::PayoffCurve;
pub use crate::risk::RiskSummary;
