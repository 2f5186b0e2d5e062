//! Market snapshot loading
//!
//! A snapshot is four JSON arrays exported from the exchange: option quotes,
//! futures quotes, and the margin tables for each. Only the option quotes are
//! required; a missing or unreadable optional file leaves that part empty.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::{
    symbol, InstrumentKind, Leg, MarginRecord, MarginTable, Quote, StrategyError, StrategyResult,
};

/// Snapshot file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotPaths {
    pub option_market: PathBuf,
    pub future_market: Option<PathBuf>,
    pub option_margin: Option<PathBuf>,
    pub future_margin: Option<PathBuf>,
}

impl Default for SnapshotPaths {
    fn default() -> Self {
        Self {
            option_market: PathBuf::from("./data/market_data_S50OPTION.json"),
            future_market: Some(PathBuf::from("./data/market_data_S50.json")),
            option_margin: Some(PathBuf::from("./data/margin_data_option.json")),
            future_margin: Some(PathBuf::from("./data/margin_data_future.json")),
        }
    }
}

/// A quote with its decoded contract terms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRow {
    pub series: String,
    pub kind: InstrumentKind,
    pub strike: Option<f64>,
    pub expiry_index: Option<i32>,
}

impl MarketRow {
    /// Decode a quote's symbol; `None` when not even the kind is readable
    pub fn from_quote(quote: &Quote) -> Option<Self> {
        let (kind, strike) = match symbol::parse_kind_and_strike(&quote.series) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Skipping series {}: {}", quote.series, e);
                return None;
            }
        };
        let expiry_index = symbol::parse_expiry(&quote.series).ok().map(|e| e.index);
        Some(Self {
            series: quote.series.clone(),
            kind,
            strike,
            expiry_index,
        })
    }
}

/// Read-only market and margin data for one session
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub options: Vec<Quote>,
    pub futures: Vec<Quote>,
    pub option_margins: MarginTable,
    pub future_margins: MarginTable,
}

impl MarketSnapshot {
    pub fn new(options: Vec<Quote>, futures: Vec<Quote>) -> Self {
        Self {
            options,
            futures,
            ..Default::default()
        }
    }

    pub fn with_margins(mut self, option_margins: MarginTable, future_margins: MarginTable) -> Self {
        self.option_margins = option_margins;
        self.future_margins = future_margins;
        self
    }

    /// Load every file named in `paths`
    pub fn load(paths: &SnapshotPaths) -> StrategyResult<Self> {
        let options: Vec<Quote> = read_records(&paths.option_market)?;
        let futures: Vec<Quote> = read_optional(paths.future_market.as_deref());
        let option_margins: MarginTable =
            read_optional::<MarginRecord>(paths.option_margin.as_deref()).into_iter().collect();
        let future_margins: MarginTable =
            read_optional::<MarginRecord>(paths.future_margin.as_deref()).into_iter().collect();

        tracing::info!(
            "Loaded snapshot: {} options, {} futures, {} option margins, {} future margins",
            options.len(),
            futures.len(),
            option_margins.len(),
            future_margins.len()
        );

        Ok(Self {
            options,
            futures,
            option_margins,
            future_margins,
        })
    }

    /// Quote for a series, options first
    pub fn find(&self, series: &str) -> Option<&Quote> {
        self.options
            .iter()
            .chain(self.futures.iter())
            .find(|q| q.series == series)
    }

    fn is_future(&self, series: &str) -> bool {
        !self.options.iter().any(|q| q.series == series)
            && self.futures.iter().any(|q| q.series == series)
    }

    /// Margin record for a series from the matching table
    pub fn margin(&self, series: &str) -> Option<&MarginRecord> {
        if self.is_future(series) {
            self.future_margins.get(series)
        } else {
            self.option_margins.get(series)
        }
    }

    /// Option quotes with decoded terms, in file order
    pub fn option_rows(&self) -> Vec<MarketRow> {
        self.options.iter().filter_map(MarketRow::from_quote).collect()
    }

    /// Futures quotes with decoded terms, in file order
    pub fn future_rows(&self) -> Vec<MarketRow> {
        self.futures.iter().filter_map(MarketRow::from_quote).collect()
    }

    /// Every series in the snapshot, options first
    pub fn all_series(&self) -> Vec<&str> {
        self.options
            .iter()
            .chain(self.futures.iter())
            .map(|q| q.series.as_str())
            .collect()
    }

    /// Contract multiplier published with the first futures row
    pub fn default_multiplier(&self) -> Option<f64> {
        self.futures
            .first()
            .and_then(|q| q.multiplier)
            .filter(|m| *m != 0.0)
    }

    /// Reference spot from the first futures row: its bid, else its resolved
    /// price, else the published underlying price
    pub fn default_spot(&self) -> Option<f64> {
        let front = self.futures.first()?;
        front
            .bid
            .or_else(|| Some(front.resolve_price()).filter(|p| !p.is_nan()))
            .or(front.underlying_price)
            .filter(|p| *p != 0.0)
    }

    /// Build a leg for a series in the snapshot, attaching its margin record
    pub fn build_leg(
        &self,
        series: &str,
        qty: i64,
        price_override: Option<f64>,
        multiplier: f64,
    ) -> StrategyResult<Leg> {
        let quote = self
            .find(series)
            .ok_or_else(|| StrategyError::data(format!("series {} not in snapshot", series)))?;
        Ok(Leg::from_quote(quote, qty, price_override, self.margin(series), multiplier))
    }
}

fn read_records<T: DeserializeOwned>(path: &Path) -> StrategyResult<Vec<T>> {
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| {
        StrategyError::data(format!("{}: {}", path.display(), e))
    })
}

fn read_optional<T: DeserializeOwned>(path: Option<&Path>) -> Vec<T> {
    let Some(path) = path else {
        return Vec::new();
    };
    match read_records(path) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("Ignoring {}: {}", path.display(), e);
            Vec::new()
        }
    }
}
