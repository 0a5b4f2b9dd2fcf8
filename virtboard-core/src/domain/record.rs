//! Record — one row of the leaderboard dataset.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-date, per-policy, per-node performance measures.
///
/// Every numeric measure is additive: summing a field across rows gives the
/// field for the union of those rows. Aggregation relies on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub policy: String,
    pub node: String,
    pub profit_total: f64,
    pub profit_short: f64,
    pub profit_long: f64,
    pub mwh_total: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub win_count_long: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub win_count_short: u64,
}

impl Record {
    /// Value of the chosen profit column.
    pub fn profit(&self, column: ProfitColumn) -> f64 {
        match column {
            ProfitColumn::Total => self.profit_total,
            ProfitColumn::Short => self.profit_short,
            ProfitColumn::Long => self.profit_long,
        }
    }

    /// Long plus short wins, saturating at `u64::MAX`.
    pub fn win_count(&self) -> u64 {
        self.win_count_long.saturating_add(self.win_count_short)
    }
}

/// Which profit column feeds the chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfitColumn {
    #[default]
    Total,
    Short,
    Long,
}

impl fmt::Display for ProfitColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Total => "total",
            Self::Short => "short",
            Self::Long => "long",
        };
        f.write_str(label)
    }
}

impl FromStr for ProfitColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" | "profit_total" => Ok(Self::Total),
            "short" | "profit_short" => Ok(Self::Short),
            "long" | "profit_long" => Ok(Self::Long),
            other => Err(format!(
                "unknown profit column '{other}' (expected total, short or long)"
            )),
        }
    }
}

/// Parse a calendar date, accepting `YYYY-MM-DD` or an ISO timestamp
/// (`YYYY-MM-DDTHH:MM:SS[.f]` / `YYYY-MM-DD HH:MM:SS[.f]`) truncated to its date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

/// Win counts arrive as integers from CSV but sometimes as integral floats
/// from dataframe JSON dumps.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Int(u64),
        Float(f64),
    }

    match Count::deserialize(deserializer)? {
        Count::Int(n) => Ok(n),
        Count::Float(x) if x >= 0.0 && x.fract() == 0.0 && x.is_finite() => Ok(x as u64),
        Count::Float(x) => Err(serde::de::Error::custom(format!(
            "win count must be a non-negative integer, got {x}"
        ))),
    }
}
