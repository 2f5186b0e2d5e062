//! Tolerant numeric ingestion
//!
//! Exchange snapshot files mix JSON numbers, formatted strings ("1,234.5")
//! and placeholder tokens ("-", "NA", "--"). Every numeric field crossing an
//! ingestion boundary goes through [`parse_num`], which never fails: an
//! unusable value becomes NaN ("no data"), never zero.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Tokens that mean "no value" in exchange exports
const PLACEHOLDERS: [&str; 5] = ["", "-", "NA", "NaN", "--"];

/// Parse a string the way exchange exports format numbers
pub fn parse_num_str(raw: &str) -> f64 {
    let cleaned = raw.trim().replace(',', "");
    if PLACEHOLDERS.contains(&cleaned.as_str()) {
        return f64::NAN;
    }
    cleaned.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse any JSON value into a number, NaN when it carries no usable data
pub fn parse_num(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_num_str(s),
        _ => f64::NAN,
    }
}

/// Same as [`parse_num`] but with absence made explicit
pub fn parse_opt(value: &Value) -> Option<f64> {
    let x = parse_num(value);
    if x.is_nan() {
        None
    } else {
        Some(x)
    }
}

/// Serde adapter for `Option<f64>` fields fed by exchange exports
pub fn deserialize_opt_num<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_opt(&value))
}

/// Serde adapter for free-text fields that may arrive as numbers or null
pub fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Sum that skips NaN terms; NaN only when every term is NaN (or there are none)
pub fn nan_skipping_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut total = 0.0;
    let mut seen = false;
    for v in values.into_iter().filter(|v| !v.is_nan()) {
        total += v;
        seen = true;
    }
    if seen {
        total
    } else {
        f64::NAN
    }
}
