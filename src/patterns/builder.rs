//! Template instantiation against a market snapshot
//!
//! Each component is resolved to a listed series by walking a ladder of
//! progressively looser searches:
//!
//! 1. Exact: strike and expiry at the component's offsets, matching kind
//! 2. Nearest strike on the target expiry (lower preferred for negative
//!    strike offsets, higher otherwise)
//! 3. Target strike on the nearest expiry
//! 4. Futures: first listed future on the target expiry
//! 5. Any series of the kind, nearest by strike plus expiry distance
//!
//! A series is used at most once. Components nothing resolves become
//! zero-quantity placeholder legs.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{median, mode, StrategyTemplate, TemplateComponent};
use crate::core::{InstrumentKind, Leg, StrategyResult};
use crate::data::{MarketRow, MarketSnapshot};

/// Concrete legs produced from a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateInstance {
    pub template: String,
    /// Resolved legs in component order, then one placeholder per missing component
    pub legs: Vec<Leg>,
    /// Components no listed series could fill
    pub missing: Vec<TemplateComponent>,
}

impl TemplateInstance {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// ATM anchors of a market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketReference {
    /// Distinct listed option strikes, ascending
    pub strikes: Vec<f64>,
    /// Distinct listed option expiry indices, ascending
    pub expiries: Vec<i32>,
    /// Spot the ATM strike was chosen against
    pub spot: f64,
    /// Position of the ATM strike in `strikes`
    pub atm_strike_pos: Option<usize>,
    /// ATM expiry index
    pub atm_expiry: Option<i32>,
}

impl MarketReference {
    /// ATM strike nearest `spot` (median strike without one); ATM expiry is
    /// the most common expiry listed at that strike, else the middle expiry
    pub fn from_rows(rows: &[MarketRow], spot: Option<f64>) -> Self {
        let mut strikes: Vec<f64> = rows
            .iter()
            .filter_map(|r| r.strike)
            .filter(|k| k.is_finite())
            .collect();
        strikes.sort_by(f64::total_cmp);
        strikes.dedup();

        let mut expiries: Vec<i32> = rows.iter().filter_map(|r| r.expiry_index).collect();
        expiries.sort_unstable();
        expiries.dedup();

        let spot = spot
            .filter(|s| *s > 0.0)
            .or_else(|| median(&strikes))
            .unwrap_or(0.0);

        let atm_strike_pos = strikes
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &k)| {
                let dist = (k - spot).abs();
                match best {
                    Some((_, d)) if d <= dist => best,
                    _ => Some((i, dist)),
                }
            })
            .map(|(i, _)| i);

        let atm_expiry = atm_strike_pos
            .and_then(|pos| {
                let atm = strikes[pos];
                mode(
                    rows.iter()
                        .filter(|r| r.strike.is_some_and(|k| same_level(k, atm)))
                        .filter_map(|r| r.expiry_index),
                )
            })
            .or_else(|| expiries.get(expiries.len() / 2).copied());

        Self {
            strikes,
            expiries,
            spot,
            atm_strike_pos,
            atm_expiry,
        }
    }

    /// Listed strike `offset` steps from ATM
    pub fn target_strike(&self, offset: i64) -> Option<f64> {
        let pos = i64::try_from(self.atm_strike_pos?).ok()?.checked_add(offset)?;
        usize::try_from(pos).ok().and_then(|p| self.strikes.get(p).copied())
    }

    /// Listed expiry `offset` positions from the ATM expiry
    pub fn target_expiry(&self, offset: i64) -> Option<i32> {
        let atm = self.atm_expiry?;
        let base = i64::try_from(self.expiries.iter().position(|&e| e == atm)?).ok()?;
        usize::try_from(base.checked_add(offset)?)
            .ok()
            .and_then(|p| self.expiries.get(p).copied())
    }
}

/// Resolves templates to listed series
pub struct TemplateBuilder<'a> {
    market: &'a MarketSnapshot,
    options: Vec<MarketRow>,
    futures: Vec<MarketRow>,
    multiplier: f64,
}

impl<'a> TemplateBuilder<'a> {
    pub fn new(market: &'a MarketSnapshot, multiplier: f64) -> Self {
        Self {
            market,
            options: market.option_rows(),
            futures: market.future_rows(),
            multiplier,
        }
    }

    /// ATM anchors for the given spot
    pub fn reference(&self, spot: Option<f64>) -> MarketReference {
        MarketReference::from_rows(&self.options, spot)
    }

    /// Build the template's legs at their default quantities
    pub fn instantiate(
        &self,
        template: &StrategyTemplate,
        spot: Option<f64>,
    ) -> StrategyResult<TemplateInstance> {
        let reference = self.reference(spot);
        let mut used: HashSet<String> = HashSet::new();
        let mut legs = Vec::with_capacity(template.components.len());
        let mut missing = Vec::new();

        for component in &template.components {
            match self.resolve(component, &reference, &used) {
                Some(series) => {
                    legs.push(self.market.build_leg(&series, component.qty, None, self.multiplier)?);
                    used.insert(series);
                }
                None => {
                    tracing::warn!(
                        "Template {}: no series for {} (target strike {:?}, target expiry {:?})",
                        template.name,
                        component.missing_label(),
                        reference.target_strike(component.relative_strike),
                        reference.target_expiry(component.relative_expiry)
                    );
                    missing.push(component.clone());
                }
            }
        }

        legs.extend(missing.iter().map(|c| Leg::placeholder(c.missing_label())));

        Ok(TemplateInstance {
            template: template.name.clone(),
            legs,
            missing,
        })
    }

    /// Series chosen for one component, if any
    pub fn resolve(
        &self,
        component: &TemplateComponent,
        reference: &MarketReference,
        used: &HashSet<String>,
    ) -> Option<String> {
        let kind = component.kind;
        let target_strike = reference.target_strike(component.relative_strike);
        let target_expiry = reference.target_expiry(component.relative_expiry);

        if kind == InstrumentKind::Future {
            let expiry = target_expiry?;
            return self
                .futures
                .iter()
                .find(|r| !used.contains(&r.series) && r.expiry_index == Some(expiry))
                .map(|r| r.series.clone());
        }

        let of_kind: Vec<&MarketRow> = self.options.iter().filter(|r| r.kind == kind).collect();

        // Exact
        if let (Some(strike), Some(expiry)) = (target_strike, target_expiry) {
            let exact = of_kind.iter().find(|r| {
                !used.contains(&r.series)
                    && r.expiry_index == Some(expiry)
                    && r.strike.is_some_and(|k| same_level(k, strike))
            });
            if let Some(row) = exact {
                return Some(row.series.clone());
            }
        }

        // Nearest strike on the target expiry
        if let Some(expiry) = target_expiry {
            let base = target_strike.unwrap_or(reference.spot);
            let mut candidates: Vec<(f64, u8, &MarketRow)> = of_kind
                .iter()
                .filter(|r| r.expiry_index == Some(expiry))
                .map(|r| {
                    let k = r.strike.unwrap_or(base);
                    let preferred = if component.relative_strike < 0 { k <= base } else { k >= base };
                    ((k - base).abs(), u8::from(!preferred), *r)
                })
                .collect();
            candidates.sort_by(|a, b| by_distance(a.0, b.0).then(a.1.cmp(&b.1)));
            if let Some((_, _, row)) = candidates.iter().find(|(_, _, r)| !used.contains(&r.series)) {
                return Some(row.series.clone());
            }
        }

        // Target strike on the nearest expiry
        if let (Some(strike), Some(atm_expiry)) = (target_strike, reference.atm_expiry) {
            let goal = target_expiry.unwrap_or(atm_expiry);
            let mut candidates: Vec<(i32, &MarketRow)> = of_kind
                .iter()
                .filter(|r| r.strike.is_some_and(|k| same_level(k, strike)))
                .map(|r| ((r.expiry_index.unwrap_or(atm_expiry) - goal).abs(), *r))
                .collect();
            candidates.sort_by_key(|(dist, _)| *dist);
            if let Some((_, row)) = candidates.iter().find(|(_, r)| !used.contains(&r.series)) {
                return Some(row.series.clone());
            }
        }

        // Any series of the kind
        let base_strike = target_strike.unwrap_or(reference.spot);
        let base_expiry = target_expiry.or(reference.atm_expiry).unwrap_or(0);
        let mut candidates: Vec<(f64, &MarketRow)> = of_kind
            .iter()
            .map(|r| {
                let strike_dist = (r.strike.unwrap_or(base_strike) - base_strike).abs();
                let expiry_dist = (r.expiry_index.unwrap_or(base_expiry) - base_expiry).abs();
                (strike_dist + expiry_dist as f64, *r)
            })
            .collect();
        candidates.sort_by(|a, b| by_distance(a.0, b.0));
        candidates
            .iter()
            .find(|(_, r)| !used.contains(&r.series))
            .map(|(_, r)| r.series.clone())
    }
}

/// Strike equality within float noise
fn same_level(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}

fn by_distance(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Quote;
    use crate::patterns::{detect, TemplateLibrary};

    fn quote(series: &str, last: f64) -> Quote {
        let mut q = Quote::new(series);
        q.last = Some(last);
        q
    }

    /// Z25 calls and puts 850..950, H26 calls at 900 and 925, one Z25 future
    fn market() -> MarketSnapshot {
        let mut options = Vec::new();
        for strike in [850, 875, 900, 925, 950] {
            options.push(quote(&format!("S50Z25C{}", strike), 10.0));
            options.push(quote(&format!("S50Z25P{}", strike), 10.0));
        }
        options.push(quote("S50H26C900", 25.0));
        options.push(quote("S50H26C925", 15.0));
        MarketSnapshot::new(options, vec![quote("S50Z25", 901.0)])
    }

    fn template(name: &str, components: &[(InstrumentKind, i64, i64, i64)]) -> StrategyTemplate {
        StrategyTemplate::new(
            name,
            components
                .iter()
                .map(|&(kind, qty, rs, re)| TemplateComponent::new(kind, qty, rs, re))
                .collect(),
        )
    }

    fn series(instance: &TemplateInstance) -> Vec<&str> {
        instance.legs.iter().map(|l| l.series.as_str()).collect()
    }

    #[test]
    fn test_market_reference() {
        let market = market();
        let builder = TemplateBuilder::new(&market, 200.0);

        let reference = builder.reference(Some(902.0));
        assert_eq!(reference.strikes, vec![850.0, 875.0, 900.0, 925.0, 950.0]);
        assert_eq!(reference.expiries, vec![311, 314]);
        assert_eq!(reference.atm_strike_pos, Some(2));
        // Two Z25 series at 900 against one H26
        assert_eq!(reference.atm_expiry, Some(311));
        assert_eq!(reference.target_strike(-2), Some(850.0));
        assert_eq!(reference.target_strike(3), None);
        assert_eq!(reference.target_expiry(1), Some(314));
        assert_eq!(reference.target_expiry(-1), None);
        assert_eq!(reference.target_strike(i64::MAX), None);
        assert_eq!(reference.target_strike(i64::MIN), None);
        assert_eq!(reference.target_expiry(i64::MAX), None);
        assert_eq!(reference.target_expiry(i64::MIN), None);

        // Without a spot the median strike is ATM
        assert_eq!(builder.reference(None).spot, 900.0);
    }

    #[test]
    fn test_instantiate_exact() {
        use InstrumentKind::*;
        let market = market();
        let builder = TemplateBuilder::new(&market, 200.0);

        let butterfly = template("Long Call Butterfly", &[(Call, 1, -1, 0), (Call, -2, 0, 0), (Call, 1, 1, 0)]);
        let instance = builder.instantiate(&butterfly, Some(902.0)).unwrap();

        assert!(instance.is_complete());
        assert_eq!(series(&instance), vec!["S50Z25C875", "S50Z25C900", "S50Z25C925"]);
        assert_eq!(instance.legs[1].qty, -2);
        assert_eq!(instance.legs[1].multiplier, 200.0);

        let calendar = template("Call Calendar", &[(Call, -1, 0, 0), (Call, 1, 0, 1)]);
        let instance = builder.instantiate(&calendar, Some(902.0)).unwrap();
        assert_eq!(series(&instance), vec!["S50Z25C900", "S50H26C900"]);
    }

    #[test]
    fn test_instantiated_template_matches_itself() {
        use InstrumentKind::*;
        let market = market();
        let builder = TemplateBuilder::new(&market, 200.0);
        let library = TemplateLibrary::new(vec![
            template("Long Straddle", &[(Call, 1, 0, 0), (Put, 1, 0, 0)]),
            template("Bull Call Spread", &[(Call, 1, 0, 0), (Call, -1, 1, 0)]),
            template("Bear Put Spread", &[(Put, 1, 0, 0), (Put, -1, -1, 0)]),
            template("Long Call Butterfly", &[(Call, 1, -1, 0), (Call, -2, 0, 0), (Call, 1, 1, 0)]),
        ]);

        for tpl in library.iter() {
            let instance = builder.instantiate(tpl, Some(900.0)).unwrap();
            let found = detect(&instance.legs, 900.0, &library).unwrap();
            assert_eq!(found.name, tpl.name);
            assert_eq!(found.score, 0);
        }
    }

    #[test]
    fn test_fallbacks_and_no_reuse() {
        use InstrumentKind::*;
        let market = market();
        let builder = TemplateBuilder::new(&market, 200.0);

        // +3 is off the strike list: nearest unused call on Z25 above spot
        let wide = template("Wide", &[(Call, 1, 0, 0), (Call, -1, 3, 0)]);
        let instance = builder.instantiate(&wide, Some(902.0)).unwrap();
        assert_eq!(series(&instance), vec!["S50Z25C900", "S50Z25C925"]);

        // No H26 puts and Z25P925 is taken: 900 and 950 are equally far,
        // listing order decides
        let put_calendar = template("Put Calendar", &[(Put, -1, 1, 0), (Put, 1, 1, 1)]);
        let instance = builder.instantiate(&put_calendar, Some(902.0)).unwrap();
        assert_eq!(series(&instance), vec!["S50Z25P925", "S50Z25P900"]);
        assert!(instance.is_complete());
    }

    #[test]
    fn test_missing_components_become_placeholders() {
        use InstrumentKind::*;
        let market = market();
        let builder = TemplateBuilder::new(&market, 200.0);

        let hedged = template("Hedged", &[(Future, -1, 0, 0), (Future, 1, 0, 1), (Call, 1, 0, 0)]);
        let instance = builder.instantiate(&hedged, Some(902.0)).unwrap();

        assert_eq!(instance.missing, vec![TemplateComponent::new(Future, 1, 0, 1)]);
        assert_eq!(
            series(&instance),
            vec!["S50Z25", "S50Z25C900", "Missing Future (rs=0, re=1)"]
        );
        let placeholder = instance.legs.last().unwrap();
        assert_eq!(placeholder.qty, 0);
        assert!(!placeholder.is_active());
    }

    #[test]
    fn test_extreme_offsets_from_template_file() {
        use InstrumentKind::*;
        let market = market();
        let builder = TemplateBuilder::new(&market, 200.0);

        let wild = template("Wild", &[(Call, 1, i64::MAX, 0), (Future, 1, 0, i64::MAX)]);
        let instance = builder.instantiate(&wild, Some(902.0)).unwrap();

        // The call falls back to the nearest listed call; no future is that far out
        assert_eq!(instance.legs.len(), 2);
        assert_eq!(instance.legs[0].kind, Some(Call));
        assert_eq!(instance.missing, vec![TemplateComponent::new(Future, 1, 0, i64::MAX)]);
        assert!(!instance.legs[1].is_active());
    }

    #[test]
    fn test_empty_market() {
        let market = MarketSnapshot::default();
        let builder = TemplateBuilder::new(&market, 200.0);
        let straddle = template("Long Straddle", &[(InstrumentKind::Call, 1, 0, 0)]);

        let instance = builder.instantiate(&straddle, None).unwrap();
        assert_eq!(instance.missing.len(), 1);
        assert_eq!(instance.legs.len(), 1);
        assert_eq!(instance.legs[0].series, "Missing Call (rs=0, re=0)");
    }
}
