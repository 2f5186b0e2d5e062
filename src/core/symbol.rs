//! Exchange symbol decoding
//!
//! Series symbols follow the futures month-code convention:
//!
//! - Futures: `[Underlying][Month][YY]`, e.g. `S50Z25` (December 2025)
//! - Options: `[Underlying][Month][YY][C/P][Strike]`, e.g. `S50H26C900`
//!
//! Month letters run F G H J K M N Q U V X Z (January to December). The
//! symbol layout is an external wire format and is decoded positionally.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::error::{StrategyError, StrategyResult};
use super::instrument::{Expiry, Instrument, InstrumentKind};

/// Month letters in calendar order
pub const EXPIRY_ORDER: &str = "FGHJKMNQUVXZ";

/// Option symbols end in a kind letter plus a 3-digit strike
const OPTION_SUFFIX_LEN: usize = 4;

/// Anything this short is a futures-style symbol
const FUTURE_MAX_LEN: usize = 7;

/// Month letter + 2-digit year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpiryCode {
    pub letter: char,
    pub year2: u32,
}

impl ExpiryCode {
    /// Parse a 3-character code such as "Z25"
    pub fn parse(code: &str) -> StrategyResult<Self> {
        let chars: Vec<char> = code.trim().chars().collect();
        if chars.len() != 3 {
            return Err(StrategyError::decode(format!(
                "expiry code must be 3 characters, got {:?}",
                code
            )));
        }
        Self::from_chars(chars[0], chars[1], chars[2])
    }

    fn from_chars(letter: char, tens: char, units: char) -> StrategyResult<Self> {
        if month_from_letter(letter).is_none() {
            return Err(StrategyError::decode(format!(
                "unknown month letter {:?}",
                letter
            )));
        }
        match (tens.to_digit(10), units.to_digit(10)) {
            (Some(t), Some(u)) => Ok(Self {
                letter,
                year2: t * 10 + u,
            }),
            _ => Err(StrategyError::decode(format!(
                "invalid 2-digit year {}{}",
                tens, units
            ))),
        }
    }

    /// Position in the F..Z month cycle (0-based)
    pub fn cycle_position(&self) -> i32 {
        EXPIRY_ORDER.find(self.letter).map(|p| p as i32).unwrap_or(0)
    }

    /// Calendar month (1-12)
    pub fn month(&self) -> u32 {
        month_from_letter(self.letter).unwrap_or(1)
    }

    pub fn year(&self) -> i32 {
        2000 + self.year2 as i32
    }

    /// Sort key used for every expiry offset computation
    pub fn index(&self) -> i32 {
        self.cycle_position() + self.year2 as i32 * 12
    }

    /// Third Friday of the contract month, else the 15th
    pub fn expiry_date(&self) -> StrategyResult<NaiveDate> {
        contract_expiry_date(self.year(), self.month()).ok_or_else(|| {
            StrategyError::decode(format!("no calendar date for {}", self.code()))
        })
    }

    pub fn code(&self) -> String {
        format!("{}{:02}", self.letter, self.year2)
    }

    pub fn to_expiry(&self) -> StrategyResult<Expiry> {
        Ok(Expiry {
            code: self.code(),
            index: self.index(),
            date: self.expiry_date()?,
        })
    }
}

/// Month letter to calendar month
pub fn month_from_letter(letter: char) -> Option<u32> {
    EXPIRY_ORDER.find(letter).map(|p| p as u32 + 1)
}

/// Expiry day for a contract month: the 3rd Friday, or the 15th when the
/// month has fewer than three Fridays
pub fn contract_expiry_date(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Fri, 3)
        .filter(|d| d.month() == month)
        .or_else(|| NaiveDate::from_ymd_opt(year, month, 15))
}

/// Kind and strike from a symbol.
///
/// Any 'C' makes the symbol a call, read from its last 'C'; otherwise the
/// last 'P' marks a put. Symbols with neither are futures.
pub fn parse_kind_and_strike(symbol: &str) -> StrategyResult<(InstrumentKind, Option<f64>)> {
    let symbol = symbol.trim();
    let marker = symbol
        .rfind('C')
        .map(|c| (c, InstrumentKind::Call))
        .or_else(|| symbol.rfind('P').map(|p| (p, InstrumentKind::Put)));

    let Some((idx, kind)) = marker else {
        return Ok((InstrumentKind::Future, None));
    };

    let strike_part = &symbol[idx + 1..];
    if let Ok(strike) = strike_part.trim().parse::<f64>() {
        return Ok((kind, Some(strike)));
    }

    // Non-numeric tail: fall back to every digit in the symbol
    let digits: String = symbol.chars().filter(|c| c.is_ascii_digit()).collect();
    digits
        .parse::<f64>()
        .map(|strike| (kind, Some(strike)))
        .map_err(|_| StrategyError::decode(format!("no strike in {:?}", symbol)))
}

/// Expiry terms from a symbol
pub fn parse_expiry(symbol: &str) -> StrategyResult<Expiry> {
    let chars: Vec<char> = symbol.trim().chars().collect();

    let code = if chars.len() <= FUTURE_MAX_LEN {
        code_ending_at(&chars, chars.len())
    } else {
        // Fixed-width suffix first; strikes wider than three digits shift
        // the code, so retry anchored on the kind letter.
        code_ending_at(&chars, chars.len() - OPTION_SUFFIX_LEN).or_else(|err| {
            chars
                .iter()
                .rposition(|&c| c == 'C' || c == 'P')
                .ok_or(err)
                .and_then(|kind_idx| code_ending_at(&chars, kind_idx))
        })
    }?;

    code.to_expiry()
}

fn code_ending_at(chars: &[char], end: usize) -> StrategyResult<ExpiryCode> {
    if end < 3 {
        return Err(StrategyError::decode(format!(
            "symbol too short for an expiry code: {:?}",
            chars.iter().collect::<String>()
        )));
    }
    ExpiryCode::from_chars(chars[end - 3], chars[end - 2], chars[end - 1])
}

/// Decode a series symbol into contract terms
pub fn decode(symbol: &str) -> StrategyResult<Instrument> {
    let (kind, strike) = parse_kind_and_strike(symbol)?;
    let expiry = parse_expiry(symbol)?;

    Ok(Instrument {
        symbol: symbol.trim().to_string(),
        kind,
        strike,
        expiry,
    })
}
