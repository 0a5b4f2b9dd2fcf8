//! virtboard engine — leaderboard analytics over trading-policy records.
//!
//! This crate builds on `virtboard-core` to provide:
//! - `Leaderboard`: original/excluded/window views with cumulative date
//!   exclusions, a movable inspection window and display state
//! - Grouped summaries (PnL, per MWh, win %) with per-policy top-N selection
//! - Sort metrics in descending order, undefined values first
//! - TOML board configuration
//! - CSV/JSON export of views and summaries, cumulative chart series

pub mod config;
pub mod export;
pub mod leaderboard;
pub mod metric;
pub mod series;
pub mod summary;
pub mod view;

pub use config::{BoardConfig, BoardDefaults, ConfigError};
pub use export::{
    export_records_csv, export_series_csv, export_summary_csv, export_summary_json, save_view,
    summary_table,
};
pub use leaderboard::{BoardError, BoardState, Leaderboard};
pub use metric::SortMetric;
pub use series::{cumulative_series, GroupSeries, SeriesPoint};
pub use summary::{aggregate, summarize_records, top_n_keys, GroupTotals, Grouping, SummaryRow};
pub use view::{ActiveView, ViewKind};
