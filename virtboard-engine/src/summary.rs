//! Grouped aggregation and top-N selection.
//!
//! Aggregation sums every additive measure per group, then derives
//! `per MWh = PnL / mwh_total` and `win % = 100 × wins / mwh_total`.
//! When a group's volume sums to zero both ratios are NaN, which consumers
//! must read as "no data" rather than zero.
//!
//! Groups are emitted in order of first appearance in the input view, and
//! sorting is stable, so ties keep that order.

use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::metric::SortMetric;
use virtboard_core::{GroupKey, Record, RecordSet};

/// Grouping grain for the displayed summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// One row per policy.
    #[default]
    Policy,
    /// One row per (policy, node).
    PolicyNode,
}

impl Grouping {
    pub fn from_policy_only(policy_only: bool) -> Self {
        if policy_only {
            Self::Policy
        } else {
            Self::PolicyNode
        }
    }

    pub fn is_policy_only(&self) -> bool {
        matches!(self, Self::Policy)
    }

    pub fn by_node(&self) -> bool {
        matches!(self, Self::PolicyNode)
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Policy => Self::PolicyNode,
            Self::PolicyNode => Self::Policy,
        }
    }
}

/// Sums of every additive measure over one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotals {
    pub key: GroupKey,
    pub rows: usize,
    pub profit_total: f64,
    pub profit_short: f64,
    pub profit_long: f64,
    pub mwh_total: f64,
    pub win_count_long: u64,
    pub win_count_short: u64,
}

impl GroupTotals {
    fn empty(key: GroupKey) -> Self {
        Self {
            key,
            rows: 0,
            profit_total: 0.0,
            profit_short: 0.0,
            profit_long: 0.0,
            mwh_total: 0.0,
            win_count_long: 0,
            win_count_short: 0,
        }
    }

    fn add(&mut self, r: &Record) {
        self.rows += 1;
        self.profit_total += r.profit_total;
        self.profit_short += r.profit_short;
        self.profit_long += r.profit_long;
        self.mwh_total += r.mwh_total;
        self.win_count_long = self.win_count_long.saturating_add(r.win_count_long);
        self.win_count_short = self.win_count_short.saturating_add(r.win_count_short);
    }

    pub fn win_count(&self) -> u64 {
        self.win_count_long.saturating_add(self.win_count_short)
    }

    /// Project to the displayed columns.
    pub fn summary_row(&self) -> SummaryRow {
        let (per_mwh, win_pct) = if self.mwh_total == 0.0 {
            (f64::NAN, f64::NAN)
        } else {
            (
                self.profit_total / self.mwh_total,
                100.0 * self.win_count() as f64 / self.mwh_total,
            )
        };
        SummaryRow {
            policy: self.key.policy.clone(),
            node: self.key.node.clone(),
            pnl: self.profit_total,
            per_mwh,
            win_pct,
        }
    }
}

/// One row of the leaderboard.
///
/// `per_mwh` and `win_pct` are NaN when the group has no volume; they
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(rename = "PnL")]
    pub pnl: f64,
    #[serde(rename = "per MWh")]
    pub per_mwh: f64,
    #[serde(rename = "win %")]
    pub win_pct: f64,
}

impl SummaryRow {
    pub fn key(&self) -> GroupKey {
        GroupKey {
            policy: self.policy.clone(),
            node: self.node.clone(),
        }
    }

    /// True when the ratios are undefined for lack of volume.
    pub fn has_no_volume(&self) -> bool {
        self.per_mwh.is_nan()
    }
}

/// Sum measures per group, groups in first-appearance order.
pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a Record>, by_node: bool) -> Vec<GroupTotals> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<GroupTotals> = Vec::new();

    for r in records {
        let key = GroupKey::for_record(r, by_node);
        let slot = match index.get(&key) {
            Some(&i) => i,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(GroupTotals::empty(key));
                groups.len() - 1
            }
        };
        groups[slot].add(r);
    }
    groups
}

/// Stable descending sort by `metric`, NaN first.
pub fn sort_rows(rows: &mut [SummaryRow], metric: SortMetric) {
    rows.sort_by(|a, b| metric.compare(a, b));
}

/// Aggregate, project and sort in one step.
pub fn summarize_records<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    grouping: Grouping,
    metric: SortMetric,
) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = aggregate(records, grouping.by_node())
        .iter()
        .map(GroupTotals::summary_row)
        .collect();
    sort_rows(&mut rows, metric);
    rows
}

/// For each policy, the `n` best (policy, node) pairs of `view` by `metric`.
///
/// Always computed at node grain, whatever the display grouping.
pub fn top_n_keys(view: &RecordSet, metric: SortMetric, n: NonZeroUsize) -> BTreeSet<GroupKey> {
    let ranked = summarize_records(view.iter(), Grouping::PolicyNode, metric);

    let mut taken: HashMap<&str, usize> = HashMap::new();
    let mut keys = BTreeSet::new();
    for row in &ranked {
        let count = taken.entry(row.policy.as_str()).or_insert(0);
        if *count < n.get() {
            *count += 1;
            keys.insert(row.key());
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, policy: &str, node: &str, profit: f64, mwh: f64, wins: u64) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            policy: policy.into(),
            node: node.into(),
            profit_total: profit,
            profit_short: profit / 2.0,
            profit_long: profit / 2.0,
            mwh_total: mwh,
            win_count_long: wins,
            win_count_short: 0,
        }
    }

    #[test]
    fn aggregate_sums_per_group_in_first_seen_order() {
        let rows = vec![
            record(1, "B", "n1", 10.0, 1.0, 1),
            record(1, "A", "n1", 5.0, 2.0, 0),
            record(2, "B", "n2", -3.0, 1.0, 0),
        ];
        let groups = aggregate(&rows, false);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, GroupKey::policy("B"));
        assert_eq!(groups[0].profit_total, 7.0);
        assert_eq!(groups[0].mwh_total, 2.0);
        assert_eq!(groups[0].rows, 2);
        assert_eq!(groups[1].key, GroupKey::policy("A"));
    }

    #[test]
    fn node_grain_splits_policies() {
        let rows = vec![
            record(1, "A", "n1", 10.0, 1.0, 1),
            record(2, "A", "n2", 5.0, 2.0, 0),
            record(3, "A", "n1", 1.0, 1.0, 0),
        ];
        let groups = aggregate(&rows, true);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, GroupKey::policy_node("A", "n1"));
        assert_eq!(groups[0].profit_total, 11.0);
    }

    #[test]
    fn ratios_from_summed_measures() {
        let rows = vec![
            record(1, "A", "n1", 100.0, 10.0, 1),
            record(2, "A", "n2", -50.0, 5.0, 0),
        ];
        let summary = summarize_records(&rows, Grouping::Policy, SortMetric::Pnl);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].pnl, 50.0);
        assert!((summary[0].per_mwh - 50.0 / 15.0).abs() < 1e-12);
        assert!((summary[0].win_pct - 100.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn zero_volume_yields_nan_sentinel() {
        let rows = vec![record(1, "A", "n1", 20.0, 0.0, 2)];
        let summary = summarize_records(&rows, Grouping::Policy, SortMetric::Pnl);
        assert_eq!(summary[0].pnl, 20.0);
        assert!(summary[0].per_mwh.is_nan());
        assert!(summary[0].win_pct.is_nan());
        assert!(summary[0].has_no_volume());
    }

    #[test]
    fn huge_win_counts_saturate() {
        let mut a = record(1, "A", "n1", 1.0, 1.0, u64::MAX);
        a.win_count_short = 1;
        let b = record(2, "A", "n1", 1.0, 1.0, u64::MAX);
        let groups = aggregate(&[a, b], false);
        assert_eq!(groups[0].win_count_long, u64::MAX);
        assert_eq!(groups[0].win_count(), u64::MAX);
        assert!(groups[0].summary_row().win_pct.is_finite());
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let rows = vec![
            record(1, "C", "n1", 5.0, 1.0, 0),
            record(1, "A", "n1", 9.0, 1.0, 0),
            record(1, "B", "n1", 5.0, 1.0, 0),
        ];
        let summary = summarize_records(&rows, Grouping::Policy, SortMetric::Pnl);
        let order: Vec<&str> = summary.iter().map(|r| r.policy.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B"]);
    }

    #[test]
    fn undefined_rows_sort_first() {
        let rows = vec![
            record(1, "A", "n1", 50.0, 0.0, 0),
            record(1, "B", "n1", 1.0, 1.0, 0),
            record(1, "C", "n1", -1.0, 1.0, 0),
        ];
        let summary = summarize_records(&rows, Grouping::Policy, SortMetric::PerMwh);
        let order: Vec<&str> = summary.iter().map(|r| r.policy.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn top_n_keeps_best_nodes_per_policy() {
        let view = RecordSet::from_records(vec![
            record(1, "A", "n1", 1.0, 1.0, 0),
            record(1, "A", "n2", 3.0, 1.0, 0),
            record(1, "A", "n3", 2.0, 1.0, 0),
            record(1, "B", "n1", -5.0, 1.0, 0),
        ]);
        let keys = top_n_keys(&view, SortMetric::Pnl, NonZeroUsize::new(2).unwrap());
        let expected: BTreeSet<GroupKey> = [
            GroupKey::policy_node("A", "n2"),
            GroupKey::policy_node("A", "n3"),
            GroupKey::policy_node("B", "n1"),
        ]
        .into_iter()
        .collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn top_n_larger_than_available_keeps_all() {
        let view = RecordSet::from_records(vec![
            record(1, "A", "n1", 1.0, 1.0, 0),
            record(1, "A", "n2", 3.0, 1.0, 0),
        ]);
        let keys = top_n_keys(&view, SortMetric::Pnl, NonZeroUsize::new(10).unwrap());
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn grouping_toggle() {
        assert_eq!(Grouping::default(), Grouping::Policy);
        assert_eq!(Grouping::Policy.toggled(), Grouping::PolicyNode);
        assert_eq!(Grouping::from_policy_only(false), Grouping::PolicyNode);
        assert!(Grouping::PolicyNode.by_node());
    }
}
