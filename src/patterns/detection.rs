//! Pattern extraction and permutation scoring

use std::collections::HashMap;

use super::{MatcherConfig, PatternLeg};
use crate::core::Leg;

/// Reduce legs to their shape around `spot`.
///
/// Legs without a reference level (placeholders) are left out. The ATM
/// level is the one nearest `spot`, first in leg order on ties. The strike
/// step is the smallest gap between distinct levels.
pub fn actual_pattern(legs: &[Leg], spot: f64, config: &MatcherConfig) -> Vec<PatternLeg> {
    let placed: Vec<(&Leg, f64)> = legs
        .iter()
        .filter_map(|leg| leg.reference_level().map(|level| (leg, level)))
        .collect();
    if placed.is_empty() {
        return Vec::new();
    }

    let atm = placed
        .iter()
        .map(|&(_, level)| level)
        .fold(None, |best: Option<f64>, level| match best {
            Some(b) if (b - spot).abs() <= (level - spot).abs() => Some(b),
            _ => Some(level),
        })
        .unwrap_or(spot);

    let step = strike_step(placed.iter().map(|&(_, level)| level), config.default_strike_step);
    let modal = modal_expiry(legs);

    placed
        .iter()
        .filter_map(|&(leg, level)| {
            let kind = leg.kind?;
            let relative_expiry = match (leg.expiry_index(), modal) {
                (Some(idx), Some(mode)) => (idx - mode) as i64,
                _ => 0,
            };
            Some(PatternLeg {
                kind,
                side: leg.qty.signum(),
                relative_strike: ((level - atm) / step).round_ties_even() as i64,
                relative_expiry,
            })
        })
        .collect()
}

/// Smallest positive gap between levels, or `fallback` with fewer than two
/// distinct levels
pub fn strike_step(levels: impl IntoIterator<Item = f64>, fallback: f64) -> f64 {
    let mut sorted: Vec<f64> = levels.into_iter().filter(|x| x.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|gap| *gap > 0.0)
        .fold(None, |min: Option<f64>, gap| Some(min.map_or(gap, |m| m.min(gap))))
        .unwrap_or(fallback)
}

/// Most frequent expiry index among the legs; smallest index on ties
pub fn modal_expiry(legs: &[Leg]) -> Option<i32> {
    mode(legs.iter().filter_map(Leg::expiry_index))
}

/// Most frequent value; the smallest one on ties
pub fn mode(values: impl IntoIterator<Item = i32>) -> Option<i32> {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then(vb.cmp(va)))
        .map(|(v, _)| v)
}

/// Shift a pattern so its nearest expiry sits at offset 0.
///
/// `None` when the expiry offsets are too far apart to shift.
pub fn normalize(pattern: &[PatternLeg]) -> Option<Vec<PatternLeg>> {
    let Some(min_expiry) = pattern.iter().map(|p| p.relative_expiry).min() else {
        return Some(Vec::new());
    };
    pattern
        .iter()
        .map(|p| {
            let relative_expiry = p.relative_expiry.checked_sub(min_expiry)?;
            Some(PatternLeg { relative_expiry, ..*p })
        })
        .collect()
}

/// Lowest total pairing cost between two equally long patterns, or `None`
/// when no pairing matches every kind and side
pub fn best_permutation_score(template: &[PatternLeg], actual: &[PatternLeg]) -> Option<u64> {
    if template.len() != actual.len() {
        return None;
    }
    let mut used = vec![false; actual.len()];
    let mut best = None;
    search(template, actual, 0, 0, &mut used, &mut best);
    best
}

/// Depth-first assignment of template legs to actual legs; branches that
/// cannot beat the best complete pairing are cut
fn search(
    template: &[PatternLeg],
    actual: &[PatternLeg],
    depth: usize,
    cost: u64,
    used: &mut [bool],
    best: &mut Option<u64>,
) {
    if best.is_some_and(|b| cost >= b) {
        return;
    }
    if depth == template.len() {
        *best = Some(cost);
        return;
    }

    for j in 0..actual.len() {
        if used[j] {
            continue;
        }
        let Some(next) = template[depth]
            .distance(&actual[j])
            .and_then(|d| cost.checked_add(d))
        else {
            continue;
        };
        used[j] = true;
        search(template, actual, depth + 1, next, used, best);
        used[j] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Expiry, InstrumentKind};
    use chrono::NaiveDate;

    fn expiry(code: &str, index: i32) -> Option<Expiry> {
        Some(Expiry {
            code: code.to_string(),
            index,
            date: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
        })
    }

    fn leg(kind: InstrumentKind, strike: f64, qty: i64, exp: i32) -> Leg {
        Leg::option("X", kind, strike, expiry("Z25", exp), qty, 1.0, 1.0)
    }

    fn pleg(kind: InstrumentKind, side: i64, rs: i64, re: i64) -> PatternLeg {
        PatternLeg {
            kind,
            side,
            relative_strike: rs,
            relative_expiry: re,
        }
    }

    #[test]
    fn test_actual_pattern_iron_condor() {
        use InstrumentKind::*;
        let legs = vec![
            leg(Put, 850.0, 1, 311),
            leg(Put, 875.0, -1, 311),
            leg(Call, 925.0, -1, 311),
            leg(Call, 950.0, 1, 311),
        ];
        let pattern = actual_pattern(&legs, 901.0, &MatcherConfig::default());

        // Step 25; ATM is 925, 24 away from spot against 26 for 875
        assert_eq!(
            pattern,
            vec![
                pleg(Put, 1, -3, 0),
                pleg(Put, -1, -2, 0),
                pleg(Call, -1, 0, 0),
                pleg(Call, 1, 1, 0),
            ]
        );
    }

    #[test]
    fn test_relative_strike_rounds_half_even() {
        use InstrumentKind::*;
        // Gaps of 10 and 25 give a step of 10; 3.5 rounds to 4 and 2.5 to 2
        let legs = vec![leg(Call, 900.0, 1, 311), leg(Call, 910.0, 1, 311), leg(Call, 935.0, -1, 311)];
        let pattern = actual_pattern(&legs, 900.0, &MatcherConfig::default());
        assert_eq!(pattern[2].relative_strike, 4);

        let legs = vec![leg(Call, 900.0, 1, 311), leg(Call, 910.0, 1, 311), leg(Call, 925.0, -1, 311)];
        let pattern = actual_pattern(&legs, 900.0, &MatcherConfig::default());
        assert_eq!(pattern[2].relative_strike, 2);
    }

    #[test]
    fn test_single_strike_uses_default_step() {
        assert_eq!(strike_step([900.0, 900.0], 5.0), 5.0);
        assert_eq!(strike_step([900.0, 950.0, 925.0, 925.0], 5.0), 25.0);
    }

    #[test]
    fn test_modal_expiry_prefers_smallest_on_tie() {
        use InstrumentKind::*;
        let legs = vec![
            leg(Call, 900.0, -1, 312),
            leg(Call, 900.0, 1, 311),
            Leg::placeholder("Missing Call"),
        ];
        assert_eq!(modal_expiry(&legs), Some(311));

        let pattern = actual_pattern(&legs, 900.0, &MatcherConfig::default());
        assert_eq!(pattern.len(), 2);
        assert_eq!(pattern[0].relative_expiry, 1);
        assert_eq!(normalize(&pattern).unwrap()[0].relative_expiry, 1);
        assert_eq!(normalize(&pattern).unwrap()[1].relative_expiry, 0);
    }

    #[test]
    fn test_best_permutation_score() {
        use InstrumentKind::*;
        let template = vec![pleg(Put, 1, -1, 0), pleg(Call, 1, 1, 0)];

        let swapped = vec![pleg(Call, 1, 1, 0), pleg(Put, 1, -1, 0)];
        assert_eq!(best_permutation_score(&template, &swapped), Some(0));

        let wider = vec![pleg(Call, 1, 2, 0), pleg(Put, 1, -2, 1)];
        assert_eq!(best_permutation_score(&template, &wider), Some(3));

        let wrong_side = vec![pleg(Call, -1, 1, 0), pleg(Put, 1, -1, 0)];
        assert_eq!(best_permutation_score(&template, &wrong_side), None);

        assert_eq!(best_permutation_score(&template, &swapped[..1]), None);
    }

    #[test]
    fn test_search_picks_cheapest_pairing() {
        use InstrumentKind::*;
        // Greedy in order would pair (0,0) then (1,1) for cost 4; the best is 0
        let template = vec![pleg(Call, 1, 0, 0), pleg(Call, 1, 2, 0)];
        let actual = vec![pleg(Call, 1, 2, 0), pleg(Call, 1, 0, 0)];
        assert_eq!(best_permutation_score(&template, &actual), Some(0));
    }

    #[test]
    fn test_extreme_offsets_do_not_overflow() {
        use InstrumentKind::*;
        // One pairing spanning the whole i64 range fits in a u64; two do not
        let template = vec![pleg(Call, 1, i64::MIN, 0), pleg(Put, 1, i64::MIN, 0)];
        let actual = vec![pleg(Call, 1, i64::MAX, 0), pleg(Put, 1, i64::MAX, 0)];
        assert_eq!(best_permutation_score(&template[..1], &actual[..1]), Some(u64::MAX));
        assert_eq!(best_permutation_score(&template, &actual), None);

        let far = pleg(Call, 1, i64::MAX, i64::MAX);
        assert_eq!(pleg(Call, 1, i64::MIN, i64::MIN).distance(&far), None);

        let calendar = vec![pleg(Call, 1, 0, i64::MAX), pleg(Call, -1, 0, i64::MIN)];
        assert_eq!(normalize(&calendar), None);
    }
}
