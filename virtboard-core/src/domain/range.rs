//! Inclusive calendar date ranges used for exclusions and the inspection window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::record::parse_date;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("invalid range: start {start} is after end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("cannot parse date range '{0}' (expected START:END, START..END or START/END)")]
    Parse(String),
}

/// `[start, end]`, both ends inclusive. Always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawRange> for DateRange {
    type Error = RangeError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range covering every representable date.
    pub fn unbounded() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    /// Single-day range.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Split `START..END`, `START/END` or `START:END` into two dates, without
/// checking their order.
///
/// Either side may be a timestamp. Timestamps contain `:` themselves, so the
/// colon form tries every colon until both halves parse.
pub fn split_bounds(s: &str) -> Option<(NaiveDate, NaiveDate)> {
    let both = |a: &str, b: &str| Some((parse_date(a)?, parse_date(b)?));
    ["..", "/"]
        .iter()
        .find_map(|sep| s.split_once(sep))
        .and_then(|(a, b)| both(a, b))
        .or_else(|| {
            s.match_indices(':')
                .find_map(|(i, _)| both(&s[..i], &s[i + 1..]))
        })
}

impl FromStr for DateRange {
    type Err = RangeError;

    /// Accepts `START:END`, `START..END` or `START/END`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = split_bounds(s).ok_or_else(|| RangeError::Parse(s.to_string()))?;
        DateRange::new(start, end)
    }
}
