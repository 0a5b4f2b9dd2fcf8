//! Property tests for leaderboard invariants.
//!
//! Uses proptest to verify:
//! 1. Containment — window ⊆ excluded ⊆ original after any mutation sequence
//! 2. Exclusion monotonicity — excluded rows never come back
//! 3. Summary additivity — PnL over disjoint date ranges adds up
//! 4. Grouping consistency — node rows sum to their policy row
//! 5. Top-N cardinality — at most k nodes feed each policy
//! 6. Sort order — descending by metric, NaN first

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use virtboard_core::{GroupKey, Record};
use virtboard_engine::{summarize_records, Grouping, Leaderboard, SortMetric, ViewKind};

// ── Strategies (proptest) ────────────────────────────────────────────

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
}

fn arb_record() -> impl Strategy<Value = Record> {
    (
        1..=20u32,
        prop::sample::select(vec!["A", "B", "C"]),
        prop::sample::select(vec!["n1", "n2", "n3", "n4"]),
        -1000..1000i32,
        prop_oneof![1 => Just(0.0), 4 => (1..500u32).prop_map(|m| m as f64 / 10.0)],
        0..5u64,
        0..5u64,
    )
        .prop_map(|(d, policy, node, cents, mwh, wl, ws)| Record {
            date: day(d),
            policy: policy.into(),
            node: node.into(),
            profit_total: cents as f64 / 4.0,
            profit_short: 0.0,
            profit_long: cents as f64 / 4.0,
            mwh_total: mwh,
            win_count_long: wl,
            win_count_short: ws,
        })
}

fn arb_dataset() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(arb_record(), 0..60)
}

#[derive(Debug, Clone)]
enum Op {
    Exclude(u32, u32),
    Window(u32, u32),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1..=20u32, 1..=20u32).prop_map(|(a, b)| Op::Exclude(a, b)),
        (1..=20u32, 1..=20u32).prop_map(|(a, b)| Op::Window(a, b)),
    ]
}

fn arb_metric() -> impl Strategy<Value = SortMetric> {
    prop::sample::select(SortMetric::ALL.to_vec())
}

fn apply(board: &mut Leaderboard, op: &Op) {
    // Inverted ranges are rejected; the invariants must hold either way.
    let _ = match *op {
        Op::Exclude(a, b) => board.exclude_region(day(a), day(b)).map(|_| ()),
        Op::Window(a, b) => board.set_window(day(a), day(b)),
    };
}

// ── 1–2. Containment and monotonicity ────────────────────────────────

proptest! {
    #[test]
    fn views_stay_nested(records in arb_dataset(), ops in prop::collection::vec(arb_op(), 0..12)) {
        let mut board = Leaderboard::from_records(records);
        for op in &ops {
            apply(&mut board, op);
            let original = board.view(ViewKind::Original);
            let excluded = board.view(ViewKind::Excluded);
            let window = board.view(ViewKind::Window);
            prop_assert!(excluded.is_subset_of(original));
            prop_assert!(window.is_subset_of(excluded));
        }
    }

    #[test]
    fn excluded_rows_never_return(records in arb_dataset(), ops in prop::collection::vec(arb_op(), 0..12)) {
        let mut board = Leaderboard::from_records(records);
        let mut previous = board.view(ViewKind::Excluded).clone();
        for op in &ops {
            apply(&mut board, op);
            let current = board.view(ViewKind::Excluded);
            prop_assert!(current.len() <= previous.len());
            prop_assert!(current.is_subset_of(&previous));
            previous = current.clone();
        }
    }

    #[test]
    fn rejected_mutation_changes_nothing(records in arb_dataset(), a in 2..=20u32, gap in 1..=5u32) {
        let mut board = Leaderboard::from_records(records);
        let before = board.state();
        let start = day(a);
        let end = day(a.saturating_sub(gap).max(1));
        prop_assume!(start > end);
        prop_assert!(board.exclude_region(start, end).is_err());
        prop_assert!(board.set_window(start, end).is_err());
        prop_assert_eq!(board.state(), before);
    }
}

// ── 3. Additivity ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn pnl_adds_over_disjoint_ranges(records in arb_dataset(), split in 1..20u32) {
        let (early, late): (Vec<Record>, Vec<Record>) =
            records.iter().cloned().partition(|r| r.date <= day(split));

        let whole = summarize_records(&records, Grouping::Policy, SortMetric::Pnl);
        let a: HashMap<String, f64> = summarize_records(&early, Grouping::Policy, SortMetric::Pnl)
            .into_iter().map(|r| (r.policy, r.pnl)).collect();
        let b: HashMap<String, f64> = summarize_records(&late, Grouping::Policy, SortMetric::Pnl)
            .into_iter().map(|r| (r.policy, r.pnl)).collect();

        for row in whole {
            let parts = a.get(&row.policy).copied().unwrap_or(0.0)
                + b.get(&row.policy).copied().unwrap_or(0.0);
            prop_assert!((row.pnl - parts).abs() < 1e-6);
        }
    }
}

// ── 4. Grouping consistency ──────────────────────────────────────────

proptest! {
    #[test]
    fn node_rows_sum_to_policy_rows(records in arb_dataset(), metric in arb_metric()) {
        let mut board = Leaderboard::from_records(records);
        board.set_metric(metric);
        let by_policy = board.summarize();
        board.toggle_grouping();
        let by_node = board.summarize();

        let mut sums: HashMap<String, f64> = HashMap::new();
        for row in &by_node {
            *sums.entry(row.policy.clone()).or_insert(0.0) += row.pnl;
        }
        prop_assert_eq!(sums.len(), by_policy.len());
        for row in &by_policy {
            prop_assert!((sums[&row.policy] - row.pnl).abs() < 1e-6);
        }
    }
}

// ── 5. Top-N cardinality ─────────────────────────────────────────────

proptest! {
    #[test]
    fn topn_limits_nodes_per_policy(records in arb_dataset(), k in 1..4usize, metric in arb_metric()) {
        let mut board = Leaderboard::from_records(records);
        board.set_metric(metric);
        board.set_topn(NonZeroUsize::new(k));

        let keys = board.top_n_keys().unwrap_or_default();
        let mut per_policy: HashMap<&str, usize> = HashMap::new();
        for key in &keys {
            *per_policy.entry(key.policy.as_str()).or_insert(0) += 1;
        }
        prop_assert!(per_policy.values().all(|&n| n <= k));

        // Summed PnL equals the PnL of the selected rows only.
        let selected: f64 = board
            .active_view()
            .iter()
            .filter(|r| keys.contains(&GroupKey::for_record(r, true)))
            .map(|r| r.profit_total)
            .sum();
        let shown: f64 = board.summarize().iter().map(|r| r.pnl).sum();
        prop_assert!((selected - shown).abs() < 1e-6);
    }
}

// ── 6. Sort order ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn summary_sorted_descending_nan_first(records in arb_dataset(), metric in arb_metric(), by_node in any::<bool>()) {
        let mut board = Leaderboard::from_records(records);
        board.set_metric(metric);
        if by_node {
            board.toggle_grouping();
        }
        let rows = board.summarize();
        let values: Vec<f64> = rows.iter().map(|r| metric.extract(r)).collect();

        let first_defined = values.iter().position(|v| !v.is_nan()).unwrap_or(values.len());
        prop_assert!(values[first_defined..].iter().all(|v| !v.is_nan()));
        prop_assert!(values[first_defined..].windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn ties_keep_first_appearance_order(records in arb_dataset()) {
        // Every group gets the same PnL so order is decided by stability alone.
        let flat: Vec<Record> = records
            .into_iter()
            .map(|mut r| { r.profit_total = 0.0; r })
            .collect();
        let mut seen: Vec<String> = Vec::new();
        for r in &flat {
            if !seen.contains(&r.policy) {
                seen.push(r.policy.clone());
            }
        }
        let rows = summarize_records(&flat, Grouping::Policy, SortMetric::Pnl);
        let order: Vec<String> = rows.into_iter().map(|r| r.policy).collect();
        prop_assert_eq!(order, seen);
    }
}
