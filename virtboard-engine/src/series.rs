//! Cumulative profit series for charting.
//!
//! Recomputed from a view on demand; the engine keeps no chart state.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use virtboard_core::{GroupKey, ProfitColumn, RecordSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Running total of one profit column for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSeries {
    pub key: GroupKey,
    pub points: Vec<SeriesPoint>,
}

impl GroupSeries {
    /// Final cumulative value, or 0 for an empty series.
    pub fn last_value(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.value)
    }
}

/// One date-ordered running sum per group, groups in first-appearance order.
///
/// Rows sharing a date within a group contribute a single point.
pub fn cumulative_series(view: &RecordSet, column: ProfitColumn, by_node: bool) -> Vec<GroupSeries> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut daily: Vec<(GroupKey, BTreeMap<NaiveDate, f64>)> = Vec::new();

    for r in view.iter() {
        let key = GroupKey::for_record(r, by_node);
        let slot = match index.get(&key) {
            Some(&i) => i,
            None => {
                index.insert(key.clone(), daily.len());
                daily.push((key, BTreeMap::new()));
                daily.len() - 1
            }
        };
        *daily[slot].1.entry(r.date).or_insert(0.0) += r.profit(column);
    }

    daily
        .into_iter()
        .map(|(key, by_date)| {
            let mut running = 0.0;
            let points = by_date
                .into_iter()
                .map(|(date, value)| {
                    running += value;
                    SeriesPoint {
                        date,
                        value: running,
                    }
                })
                .collect();
            GroupSeries { key, points }
        })
        .collect()
}
