//! Named dataset views.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which view feeds summaries and charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    /// The exclusion-filtered dataset (area mode off).
    #[default]
    Excluded,
    /// The exclusion-filtered dataset restricted to the window (area mode on).
    Windowed,
}

impl ActiveView {
    pub fn from_area_only(area_only: bool) -> Self {
        if area_only {
            Self::Windowed
        } else {
            Self::Excluded
        }
    }

    pub fn is_area_only(&self) -> bool {
        matches!(self, Self::Windowed)
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Excluded => Self::Windowed,
            Self::Windowed => Self::Excluded,
        }
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            Self::Excluded => ViewKind::Excluded,
            Self::Windowed => ViewKind::Window,
        }
    }
}

/// Any of the three views, for read-only access and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Original,
    Excluded,
    Window,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [Self::Original, Self::Excluded, Self::Window];
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Original => "original",
            Self::Excluded => "excluded",
            Self::Window => "window",
        };
        f.write_str(name)
    }
}

impl FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "excluded" | "exclusions" => Ok(Self::Excluded),
            "window" | "displayed" => Ok(Self::Window),
            other => Err(format!(
                "unknown view '{other}' (expected original, excluded or window)"
            )),
        }
    }
}
