//! TOML board configuration: the defaults an engine is built (and reset) with.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use thiserror::Error;

use crate::metric::SortMetric;
use crate::summary::Grouping;
use crate::view::ActiveView;
use virtboard_core::{DateRange, ProfitColumn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level config file.
///
/// ```toml
/// [board]
/// metric = "per MWh"
/// grouping = true
/// topn = 3
///
/// [window]
/// start = "2022-09-16"
/// end = "2024-10-15"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    pub board: BoardDefaults,
    /// Initial window. `None` means the full date range of the data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<DateRange>,
}

/// Initial engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardDefaults {
    pub metric: SortMetric,
    /// `true` groups by policy only; `false` by policy and node.
    pub grouping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topn: Option<usize>,
    pub area_only: bool,
    pub chart_type: ProfitColumn,
}

impl Default for BoardDefaults {
    fn default() -> Self {
        Self {
            metric: SortMetric::Pnl,
            grouping: true,
            topn: None,
            area_only: false,
            chart_type: ProfitColumn::Total,
        }
    }
}

impl BoardDefaults {
    pub fn grouping(&self) -> Grouping {
        Grouping::from_policy_only(self.grouping)
    }

    pub fn active_view(&self) -> ActiveView {
        ActiveView::from_area_only(self.area_only)
    }

    /// `topn = 0` is rejected by [`BoardConfig::validate`]; here it reads as unset.
    pub fn topn(&self) -> Option<NonZeroUsize> {
        self.topn.and_then(NonZeroUsize::new)
    }
}

impl BoardConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: BoardConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board.topn == Some(0) {
            return Err(ConfigError::Invalid(
                "board.topn must be a positive integer (omit it to include all nodes)".into(),
            ));
        }
        Ok(())
    }
}
