//! Sort metric — which summary column orders the leaderboard.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::leaderboard::BoardError;
use crate::summary::SummaryRow;

/// Which summary column to sort by (always descending).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum SortMetric {
    /// Summed `profit_total`.
    #[default]
    Pnl,
    /// PnL divided by summed volume.
    PerMwh,
    /// 100 × wins / summed volume.
    WinPct,
}

impl SortMetric {
    pub const ALL: [SortMetric; 3] = [Self::Pnl, Self::PerMwh, Self::WinPct];

    /// Column label used in summaries and exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pnl => "PnL",
            Self::PerMwh => "per MWh",
            Self::WinPct => "win %",
        }
    }

    /// Extract this metric from a summary row.
    pub fn extract(&self, row: &SummaryRow) -> f64 {
        match self {
            Self::Pnl => row.pnl,
            Self::PerMwh => row.per_mwh,
            Self::WinPct => row.win_pct,
        }
    }

    /// Descending order, with undefined (NaN) values ranked above every number.
    ///
    /// Returns `Ordering::Equal` for ties, so a stable sort keeps input order.
    pub fn compare(&self, a: &SummaryRow, b: &SummaryRow) -> std::cmp::Ordering {
        let (x, y) = (self.extract(a), self.extract(b));
        match (x.is_nan(), y.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            (false, false) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
        }
    }
}

impl fmt::Display for SortMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortMetric {
    type Err = BoardError;

    /// Accepts the column labels (`PnL`, `per MWh`, `win %`) in any case, plus
    /// the identifiers `pnl`, `per_mwh` and `win_pct`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pnl" => Ok(Self::Pnl),
            "per mwh" | "per_mwh" | "permwh" => Ok(Self::PerMwh),
            "win %" | "win%" | "win_pct" | "winpct" => Ok(Self::WinPct),
            _ => Err(BoardError::InvalidMetric(s.to_string())),
        }
    }
}

impl TryFrom<String> for SortMetric {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for SortMetric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
