//! The leaderboard engine: three nested views plus display state.
//!
//! `original` is the ingested dataset. `excluded` is `original` minus every
//! exclusion applied so far, and `window` is `excluded` restricted to the
//! current window bounds. All three share one row store, so after every
//! mutation `window ⊆ excluded ⊆ original` holds by row identity.
//!
//! Mutators validate before touching anything: a rejected call leaves the
//! engine exactly as it was.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::BoardConfig;
use crate::metric::SortMetric;
use crate::summary::{self, Grouping, SummaryRow};
use crate::view::{ActiveView, ViewKind};
use virtboard_core::{DatasetHash, DateRange, GroupKey, ProfitColumn, RangeError, Record, RecordSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("dataset is empty: no date range")]
    EmptyDataset,

    #[error(transparent)]
    InvalidRange(#[from] RangeError),

    #[error("unknown sort metric '{0}' (expected PnL, per MWh or win %)")]
    InvalidMetric(String),

    #[error("top-N must be a positive integer")]
    InvalidTopN,
}

/// Serializable snapshot of the engine state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardState {
    pub dataset_hash: DatasetHash,
    pub rows_original: usize,
    pub rows_excluded: usize,
    pub rows_window: usize,
    pub exclusions: Vec<DateRange>,
    pub window: DateRange,
    pub active_view: ActiveView,
    pub grouping: Grouping,
    pub topn: Option<usize>,
    pub metric: SortMetric,
    pub chart_type: ProfitColumn,
}

#[derive(Debug, Clone)]
pub struct Leaderboard {
    original: RecordSet,
    excluded: RecordSet,
    window: RecordSet,
    exclusions: Vec<DateRange>,
    window_range: DateRange,
    active: ActiveView,
    grouping: Grouping,
    topn: Option<NonZeroUsize>,
    metric: SortMetric,
    chart_type: ProfitColumn,
    defaults: BoardConfig,
    dataset_hash: DatasetHash,
}

impl Leaderboard {
    /// Build an engine over `records` with the given defaults.
    pub fn new(records: Vec<Record>, config: &BoardConfig) -> Result<Self, BoardError> {
        if config.board.topn == Some(0) {
            return Err(BoardError::InvalidTopN);
        }
        let dataset_hash = DatasetHash::of_records(&records);
        let original = RecordSet::from_records(records);
        let board = Self::build(original, dataset_hash, config.clone());

        match board.original.date_range() {
            Some((first, last)) => info!(
                rows = board.original.len(),
                first = %first,
                last = %last,
                hash = board.dataset_hash.short(),
                "leaderboard loaded"
            ),
            None => warn!(hash = board.dataset_hash.short(), "leaderboard loaded with no rows"),
        }
        Ok(board)
    }

    /// Build an engine with the default configuration.
    pub fn from_records(records: Vec<Record>) -> Self {
        let dataset_hash = DatasetHash::of_records(&records);
        Self::build(
            RecordSet::from_records(records),
            dataset_hash,
            BoardConfig::default(),
        )
    }

    fn build(original: RecordSet, dataset_hash: DatasetHash, defaults: BoardConfig) -> Self {
        let window_range = defaults.window.unwrap_or_else(|| {
            original
                .date_range()
                .and_then(|(first, last)| DateRange::new(first, last).ok())
                .unwrap_or_else(DateRange::unbounded)
        });
        let excluded = original.clone();
        let window = excluded.within(&window_range);

        Self {
            original,
            excluded,
            window,
            exclusions: Vec::new(),
            window_range,
            active: defaults.board.active_view(),
            grouping: defaults.board.grouping(),
            topn: defaults.board.topn(),
            metric: defaults.board.metric,
            chart_type: defaults.board.chart_type,
            defaults,
            dataset_hash,
        }
    }

    // ── Views ──────────────────────────────────────────────────────────

    /// First and last date of `original`.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate), BoardError> {
        self.original.date_range().ok_or(BoardError::EmptyDataset)
    }

    /// The view feeding both summaries and charts.
    pub fn active_view(&self) -> &RecordSet {
        self.view(self.active.kind())
    }

    pub fn view(&self, kind: ViewKind) -> &RecordSet {
        match kind {
            ViewKind::Original => &self.original,
            ViewKind::Excluded => &self.excluded,
            ViewKind::Window => &self.window,
        }
    }

    // ── Mutators ───────────────────────────────────────────────────────

    /// Permanently drop every row dated within `[start, end]`.
    ///
    /// Returns the number of rows removed; zero means nothing matched and
    /// nothing changed.
    pub fn exclude_region(&mut self, start: NaiveDate, end: NaiveDate) -> Result<usize, BoardError> {
        let range = DateRange::new(start, end)?;
        Ok(self.exclude(range))
    }

    /// Typed form of [`exclude_region`](Self::exclude_region).
    pub fn exclude(&mut self, range: DateRange) -> usize {
        let remaining = self.excluded.without(&range);
        let removed = self.excluded.len() - remaining.len();
        if removed == 0 {
            warn!(range = %range, "exclusion matched no remaining rows");
            return 0;
        }

        self.excluded = remaining;
        self.window = self.excluded.within(&self.window_range);
        self.exclusions.push(range);
        debug!(
            range = %range,
            removed,
            excluded_rows = self.excluded.len(),
            window_rows = self.window.len(),
            "region excluded"
        );
        removed
    }

    /// Replace the window bounds (zoom and pan are the same operation).
    pub fn set_window(&mut self, start: NaiveDate, end: NaiveDate) -> Result<(), BoardError> {
        let range = DateRange::new(start, end)?;
        self.set_window_range(range);
        Ok(())
    }

    pub fn set_window_range(&mut self, range: DateRange) {
        self.window_range = range;
        self.window = self.excluded.within(&range);
        debug!(window = %range, window_rows = self.window.len(), "window set");
    }

    pub fn toggle_area_mode(&mut self) {
        self.active = self.active.toggled();
        debug!(active_view = ?self.active, "area mode toggled");
    }

    pub fn toggle_grouping(&mut self) {
        self.grouping = self.grouping.toggled();
        debug!(grouping = ?self.grouping, "grouping toggled");
    }

    /// `None` clears the cap.
    pub fn set_topn(&mut self, topn: Option<NonZeroUsize>) {
        self.topn = topn;
        debug!(topn = ?topn.map(NonZeroUsize::get), "top-N set");
    }

    /// Untyped form of [`set_topn`](Self::set_topn); zero is rejected.
    pub fn set_topn_count(&mut self, topn: Option<usize>) -> Result<(), BoardError> {
        let topn = match topn {
            Some(n) => Some(NonZeroUsize::new(n).ok_or(BoardError::InvalidTopN)?),
            None => None,
        };
        self.set_topn(topn);
        Ok(())
    }

    pub fn set_metric(&mut self, metric: SortMetric) {
        self.metric = metric;
        debug!(metric = %metric, "sort metric set");
    }

    pub fn set_metric_named(&mut self, name: &str) -> Result<(), BoardError> {
        let metric: SortMetric = name.parse()?;
        self.set_metric(metric);
        Ok(())
    }

    pub fn set_chart_type(&mut self, column: ProfitColumn) {
        self.chart_type = column;
        debug!(chart_type = %column, "chart column set");
    }

    /// Rebuild from `original` and the construction defaults.
    pub fn reset(&mut self) {
        let original = RecordSet::clone(&self.original);
        *self = Self::build(original, self.dataset_hash.clone(), self.defaults.clone());
        info!(rows = self.original.len(), "leaderboard reset");
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Best `topn` (policy, node) pairs per policy in the active view, or
    /// `None` when no cap is set.
    pub fn top_n_keys(&self) -> Option<BTreeSet<GroupKey>> {
        self.topn
            .map(|n| summary::top_n_keys(self.active_view(), self.metric, n))
    }

    /// The leaderboard for the current state, sorted by the current metric.
    ///
    /// The top-N cap only restricts policy-level summaries.
    pub fn summarize(&self) -> Vec<SummaryRow> {
        let view = self.active_view();
        let keys = match self.grouping {
            Grouping::Policy => self.top_n_keys(),
            Grouping::PolicyNode => None,
        };

        match keys {
            Some(keys) => summary::summarize_records(
                view.iter()
                    .filter(|r| keys.contains(&GroupKey::for_record(r, true))),
                self.grouping,
                self.metric,
            ),
            None => summary::summarize_records(view.iter(), self.grouping, self.metric),
        }
    }

    pub fn state(&self) -> BoardState {
        BoardState {
            dataset_hash: self.dataset_hash.clone(),
            rows_original: self.original.len(),
            rows_excluded: self.excluded.len(),
            rows_window: self.window.len(),
            exclusions: self.exclusions.clone(),
            window: self.window_range,
            active_view: self.active,
            grouping: self.grouping,
            topn: self.topn.map(NonZeroUsize::get),
            metric: self.metric,
            chart_type: self.chart_type,
        }
    }

    pub fn exclusions(&self) -> &[DateRange] {
        &self.exclusions
    }

    pub fn window_range(&self) -> DateRange {
        self.window_range
    }

    pub fn active(&self) -> ActiveView {
        self.active
    }

    pub fn is_area_only(&self) -> bool {
        self.active.is_area_only()
    }

    pub fn grouping(&self) -> Grouping {
        self.grouping
    }

    pub fn topn(&self) -> Option<NonZeroUsize> {
        self.topn
    }

    pub fn metric(&self) -> SortMetric {
        self.metric
    }

    pub fn chart_type(&self) -> ProfitColumn {
        self.chart_type
    }

    pub fn dataset_hash(&self) -> &DatasetHash {
        &self.dataset_hash
    }

    pub fn config(&self) -> &BoardConfig {
        &self.defaults
    }
}
