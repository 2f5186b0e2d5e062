//! Configuration for pattern matching

use serde::{Deserialize, Serialize};

/// Patterns longer than this are not searched (the search is factorial)
pub const MAX_PATTERN_LEGS: usize = 8;

/// Strike step assumed when all legs share one strike
pub const DEFAULT_STRIKE_STEP: f64 = 5.0;

/// Configuration for the pattern matcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Maximum number of legs searched
    /// Default: 8
    pub max_legs: usize,

    /// Strike step used when fewer than two distinct strikes exist
    /// Default: 5.0
    pub default_strike_step: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_legs: MAX_PATTERN_LEGS,
            default_strike_step: DEFAULT_STRIKE_STEP,
        }
    }
}

impl MatcherConfig {
    /// Matcher for a market listed at a different strike step
    pub fn with_strike_step(step: f64) -> Self {
        Self {
            default_strike_step: step,
            ..Default::default()
        }
    }
}
