//! Market quote and margin records
//!
//! Records arrive as loosely-typed JSON rows keyed by the exchange's column
//! names. Numeric columns go through the tolerant parser so a malformed cell
//! becomes "absent" instead of failing the whole snapshot.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::numeric::{deserialize_opt_num, deserialize_opt_text};

/// Per-series market quote
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    /// Exchange series symbol
    #[serde(rename = "Series")]
    pub series: String,
    /// Last traded price
    #[serde(rename = "Last", default, deserialize_with = "deserialize_opt_num")]
    pub last: Option<f64>,
    /// Best bid
    #[serde(rename = "Bid", default, deserialize_with = "deserialize_opt_num")]
    pub bid: Option<f64>,
    /// Best offer
    #[serde(rename = "Offer", default, deserialize_with = "deserialize_opt_num")]
    pub offer: Option<f64>,
    /// Implied volatility in percent
    #[serde(rename = "IV LAST", default, deserialize_with = "deserialize_opt_num")]
    pub implied_vol: Option<f64>,
    /// Exchange-published theoretical value
    #[serde(rename = "THEORETICAL", default, deserialize_with = "deserialize_opt_num")]
    pub theoretical: Option<f64>,
    /// Exchange-published intrinsic value
    #[serde(rename = "INTRINSIC VALUE", default, deserialize_with = "deserialize_opt_num")]
    pub intrinsic_value: Option<f64>,
    /// ITM / ATM / OTM classification
    #[serde(rename = "MONEYNESS", default, deserialize_with = "deserialize_opt_text")]
    pub moneyness: Option<String>,
    #[serde(rename = "Days Left", default, deserialize_with = "deserialize_opt_num")]
    pub days_left: Option<f64>,
    #[serde(rename = "OI (Contract)", default, deserialize_with = "deserialize_opt_num")]
    pub open_interest: Option<f64>,
    /// Underlying reference (futures files only)
    #[serde(rename = "UNDERLYING PRICE", default, deserialize_with = "deserialize_opt_num")]
    pub underlying_price: Option<f64>,
    /// Contract multiplier (futures files only; the exchange spells it MULTIPLER)
    #[serde(rename = "MULTIPLER", default, deserialize_with = "deserialize_opt_num")]
    pub multiplier: Option<f64>,
    /// Published expiry date, preferred over the decoded one
    #[serde(rename = "ExpiryDate", default, deserialize_with = "deserialize_expiry_date")]
    pub expiry_date: Option<NaiveDate>,
}

impl Quote {
    pub fn new(series: impl Into<String>) -> Self {
        Self {
            series: series.into(),
            ..Default::default()
        }
    }

    /// Bid/offer midpoint when both sides exist
    pub fn mid(&self) -> Option<f64> {
        match (self.bid, self.offer) {
            (Some(b), Some(o)) => Some((b + o) / 2.0),
            _ => None,
        }
    }

    /// Representative trade price (last > mid > bid > offer).
    ///
    /// NaN means no usable price; it propagates through P/L math.
    pub fn resolve_price(&self) -> f64 {
        self.last
            .or_else(|| self.mid())
            .or(self.bid)
            .or(self.offer)
            .unwrap_or(f64::NAN)
    }

    /// Bid-offer spread
    pub fn spread(&self) -> Option<f64> {
        match (self.bid, self.offer) {
            (Some(b), Some(o)) => Some(o - b),
            _ => None,
        }
    }
}

/// Exchange expiry dates come as "2025-12-19" or with a time component
fn deserialize_expiry_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = deserialize_opt_text(deserializer)?;
    Ok(text.and_then(|s| {
        let date_part = s.split(['T', ' ']).next().unwrap_or_default();
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }))
}

/// Per-contract margin requirement for a series
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarginRecord {
    #[serde(rename = "Series")]
    pub series: String,
    /// Initial margin per contract
    #[serde(rename = "IM", default, deserialize_with = "deserialize_opt_num")]
    pub initial: Option<f64>,
    /// Maintenance margin per contract
    #[serde(rename = "MM", default, deserialize_with = "deserialize_opt_num")]
    pub maintenance: Option<f64>,
}

/// Margin lookup by series
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarginTable {
    records: HashMap<String, MarginRecord>,
}

impl MarginTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record; the first record for a series wins
    pub fn insert(&mut self, record: MarginRecord) {
        self.records.entry(record.series.clone()).or_insert(record);
    }

    pub fn get(&self, series: &str) -> Option<&MarginRecord> {
        self.records.get(series)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<MarginRecord> for MarginTable {
    fn from_iter<I: IntoIterator<Item = MarginRecord>>(iter: I) -> Self {
        let mut table = MarginTable::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_resolution_order() {
        let mut q = Quote::new("S50Z25C900");
        assert!(q.resolve_price().is_nan());

        q.offer = Some(12.0);
        assert_eq!(q.resolve_price(), 12.0);

        q.bid = Some(10.0);
        assert_eq!(q.resolve_price(), 11.0);
        assert_eq!(q.spread(), Some(2.0));

        q.offer = None;
        assert_eq!(q.resolve_price(), 10.0);

        q.last = Some(10.7);
        assert_eq!(q.resolve_price(), 10.7);
    }

    #[test]
    fn test_tolerant_deserialize() {
        let row = json!({
            "Series": "S50Z25C900",
            "Last": "-",
            "Bid": "1,020.5",
            "Offer": 1022.5,
            "IV LAST": "18.25",
            "MONEYNESS": "ITM",
            "Days Left": 64,
            "ExpiryDate": "2025-12-19T00:00:00",
            "Unrelated Column": "ignored"
        });
        let q: Quote = serde_json::from_value(row).unwrap();

        assert_eq!(q.last, None);
        assert_eq!(q.bid, Some(1020.5));
        assert_eq!(q.offer, Some(1022.5));
        assert_eq!(q.implied_vol, Some(18.25));
        assert_eq!(q.moneyness.as_deref(), Some("ITM"));
        assert_eq!(q.days_left, Some(64.0));
        assert_eq!(q.theoretical, None);
        assert_eq!(q.expiry_date, NaiveDate::from_ymd_opt(2025, 12, 19));
        assert_eq!(q.resolve_price(), 1021.5);
    }

    #[test]
    fn test_margin_table() {
        let rows = json!([
            {"Series": "S50Z25P850", "IM": "2,500", "MM": 1750},
            {"Series": "S50Z25P850", "IM": 9999, "MM": 9999},
            {"Series": "S50Z25C950", "IM": "NA"}
        ]);
        let records: Vec<MarginRecord> = serde_json::from_value(rows).unwrap();
        let table: MarginTable = records.into_iter().collect();

        assert_eq!(table.len(), 2);
        let put = table.get("S50Z25P850").unwrap();
        assert_eq!(put.initial, Some(2500.0));
        assert_eq!(put.maintenance, Some(1750.0));

        let call = table.get("S50Z25C950").unwrap();
        assert_eq!(call.initial, None);
        assert_eq!(call.maintenance, None);
        assert!(table.get("S50Z25").is_none());
    }
}
