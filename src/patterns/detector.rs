//! PatternMatcher - Main facade for strategy recognition
//!
//! Extracts the legs' shape once and scores it against every template.

use super::{
    actual_pattern, best_permutation_score, normalize, MatcherConfig, PatternMatch,
    TemplateLibrary,
};
use crate::core::Leg;

/// Matches a set of legs against a template library
pub struct PatternMatcher {
    config: MatcherConfig,
}

impl PatternMatcher {
    /// Create a new matcher with default configuration
    pub fn new() -> Self {
        Self {
            config: MatcherConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Get current configuration
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Best-scoring template for the legs around `spot`
    ///
    /// Only templates with as many components as there are placed legs are
    /// considered. The lowest score wins; on equal scores the template that
    /// comes first in the library wins.
    pub fn detect(&self, legs: &[Leg], spot: f64, library: &TemplateLibrary) -> Option<PatternMatch> {
        let actual = normalize(&actual_pattern(legs, spot, &self.config))?;
        if actual.is_empty() {
            return None;
        }
        if actual.len() > self.config.max_legs {
            tracing::warn!(
                "Pattern has {} legs, more than the {} searched; skipping detection",
                actual.len(),
                self.config.max_legs
            );
            return None;
        }

        let mut best: Option<PatternMatch> = None;
        for template in library.iter() {
            if template.components.len() != actual.len() {
                continue;
            }
            let Some(pattern) = normalize(&template.pattern()) else {
                tracing::warn!("Template {} has expiry offsets out of range", template.name);
                continue;
            };
            let Some(score) = best_permutation_score(&pattern, &actual) else {
                continue;
            };
            tracing::debug!("Template {} scored {}", template.name, score);

            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(PatternMatch {
                    name: template.name.clone(),
                    score,
                });
            }
        }

        best
    }

    /// Spot used for detection: the manual spot when set, else the median of
    /// the legs' reference levels
    pub fn detection_spot(manual_spot: Option<f64>, legs: &[Leg]) -> Option<f64> {
        if let Some(spot) = manual_spot.filter(|s| *s > 0.0) {
            return Some(spot);
        }
        let levels: Vec<f64> = legs.iter().filter_map(Leg::reference_level).collect();
        median(&levels)
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function: detect with default configuration
pub fn detect(legs: &[Leg], spot: f64, library: &TemplateLibrary) -> Option<PatternMatch> {
    PatternMatcher::new().detect(legs, spot, library)
}

/// Median of a sample; the mean of the middle pair for even sizes
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Expiry, InstrumentKind};
    use crate::patterns::{StrategyTemplate, TemplateComponent};
    use chrono::NaiveDate;

    fn leg(kind: InstrumentKind, strike: f64, qty: i64) -> Leg {
        let expiry = Expiry {
            code: "Z25".to_string(),
            index: 311,
            date: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
        };
        Leg::option("X", kind, strike, Some(expiry), qty, 1.0, 1.0)
    }

    fn library() -> TemplateLibrary {
        use InstrumentKind::*;
        TemplateLibrary::new(vec![
            StrategyTemplate::new(
                "Long Straddle",
                vec![TemplateComponent::new(Call, 1, 0, 0), TemplateComponent::new(Put, 1, 0, 0)],
            ),
            StrategyTemplate::new(
                "Long Strangle",
                vec![TemplateComponent::new(Call, 1, 1, 0), TemplateComponent::new(Put, 1, -1, 0)],
            ),
            StrategyTemplate::new(
                "Bull Call Spread",
                vec![TemplateComponent::new(Call, 1, 0, 0), TemplateComponent::new(Call, -1, 1, 0)],
            ),
        ])
    }

    #[test]
    fn test_detects_exact_shape() {
        use InstrumentKind::*;
        let legs = vec![leg(Put, 900.0, 2), leg(Call, 900.0, 2)];
        let found = detect(&legs, 902.0, &library()).unwrap();
        assert_eq!(found, PatternMatch { name: "Long Straddle".to_string(), score: 0 });

        let spread = vec![leg(Call, 900.0, 1), leg(Call, 925.0, -1)];
        let found = detect(&spread, 900.0, &library()).unwrap();
        assert_eq!(found.name, "Bull Call Spread");
    }

    #[test]
    fn test_first_template_wins_ties() {
        use InstrumentKind::*;
        // Call one step above an ATM put is one step off both the straddle
        // and the strangle
        let legs = vec![leg(Call, 925.0, 1), leg(Put, 900.0, 1)];
        let found = detect(&legs, 900.0, &library()).unwrap();
        assert_eq!(found.score, 1);
        assert_eq!(found.name, "Long Straddle");

        let mut reversed: Vec<StrategyTemplate> = library().iter().cloned().collect();
        reversed.swap(0, 1);
        let found = detect(&legs, 900.0, &TemplateLibrary::new(reversed)).unwrap();
        assert_eq!(found.name, "Long Strangle");
    }

    #[test]
    fn test_no_match() {
        use InstrumentKind::*;
        let three = vec![leg(Call, 900.0, 1), leg(Call, 925.0, -1), leg(Call, 950.0, -1)];
        assert_eq!(detect(&three, 900.0, &library()), None);

        let wrong_side = vec![leg(Call, 900.0, -1), leg(Put, 900.0, -1)];
        assert_eq!(detect(&wrong_side, 900.0, &library()), None);

        assert_eq!(detect(&[Leg::placeholder("Missing Call")], 900.0, &library()), None);
    }

    #[test]
    fn test_out_of_range_template_is_skipped() {
        use InstrumentKind::*;
        let mut templates: Vec<StrategyTemplate> = library().iter().cloned().collect();
        templates.insert(
            0,
            StrategyTemplate::new(
                "Wide Calendar",
                vec![
                    TemplateComponent::new(Call, 1, 0, i64::MAX),
                    TemplateComponent::new(Put, 1, 0, i64::MIN),
                ],
            ),
        );

        let legs = vec![leg(Put, 900.0, 2), leg(Call, 900.0, 2)];
        let found = detect(&legs, 902.0, &TemplateLibrary::new(templates)).unwrap();
        assert_eq!(found, PatternMatch { name: "Long Straddle".to_string(), score: 0 });
    }

    #[test]
    fn test_leg_limit() {
        let legs: Vec<Leg> = (0..9)
            .map(|i| leg(InstrumentKind::Call, 900.0 + 25.0 * i as f64, 1))
            .collect();
        let nine = StrategyTemplate::new(
            "Ladder",
            (0..9)
                .map(|i| TemplateComponent::new(InstrumentKind::Call, 1, i, 0))
                .collect(),
        );
        let library = TemplateLibrary::new(vec![nine]);

        assert_eq!(detect(&legs, 900.0, &library), None);

        let relaxed = PatternMatcher::with_config(MatcherConfig {
            max_legs: 9,
            ..Default::default()
        });
        assert_eq!(relaxed.detect(&legs, 900.0, &library).map(|m| m.score), Some(0));
    }

    #[test]
    fn test_detection_spot() {
        use InstrumentKind::*;
        let legs = vec![leg(Call, 950.0, 1), leg(Put, 850.0, 1), Leg::placeholder("x")];
        assert_eq!(PatternMatcher::detection_spot(Some(910.0), &legs), Some(910.0));
        assert_eq!(PatternMatcher::detection_spot(Some(0.0), &legs), Some(900.0));
        assert_eq!(PatternMatcher::detection_spot(None, &[]), None);
    }
}
