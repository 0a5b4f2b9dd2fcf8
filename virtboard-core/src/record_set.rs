//! RecordSet — an immutable view over a shared row store.
//!
//! All views derived from one dataset share the same `Arc<[Record]>`; a view
//! is the ordered list of `RowId`s it contains. Filtering never copies records
//! and never renumbers rows, so `a.is_subset_of(&b)` is an exact statement
//! about row identity.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::domain::{DateRange, Record, RowId};

#[derive(Debug, Clone)]
pub struct RecordSet {
    store: Arc<[Record]>,
    /// Strictly ascending.
    rows: Arc<[RowId]>,
}

impl RecordSet {
    /// Take ownership of a freshly loaded dataset. Row ids follow input order.
    pub fn from_records(records: Vec<Record>) -> Self {
        let rows: Arc<[RowId]> = (0..records.len()).map(RowId).collect();
        Self {
            store: records.into(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row ids in this view, ascending.
    pub fn row_ids(&self) -> &[RowId] {
        &self.rows
    }

    /// Records in row order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.rows.iter().map(move |id| &self.store[id.0])
    }

    /// Look up a row, but only if it belongs to this view.
    pub fn get(&self, id: RowId) -> Option<&Record> {
        self.contains(id).then(|| &self.store[id.0])
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.rows.binary_search(&id).is_ok()
    }

    /// New view keeping the rows for which `keep` is true.
    pub fn filter(&self, mut keep: impl FnMut(&Record) -> bool) -> RecordSet {
        let rows: Arc<[RowId]> = self
            .rows
            .iter()
            .copied()
            .filter(|id| keep(&self.store[id.0]))
            .collect();
        RecordSet {
            store: Arc::clone(&self.store),
            rows,
        }
    }

    /// Rows dated inside `range`.
    pub fn within(&self, range: &DateRange) -> RecordSet {
        self.filter(|r| range.contains(r.date))
    }

    /// Rows dated outside `range`.
    pub fn without(&self, range: &DateRange) -> RecordSet {
        self.filter(|r| !range.contains(r.date))
    }

    /// True when both views index the same row store.
    pub fn shares_store(&self, other: &RecordSet) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    /// Row-identity containment. Views over different stores are never subsets
    /// of each other unless `self` is empty.
    pub fn is_subset_of(&self, other: &RecordSet) -> bool {
        if self.is_empty() {
            return true;
        }
        if !self.shares_store(other) {
            return false;
        }
        // Both sides ascending: single merge pass.
        let mut theirs = other.rows.iter();
        'outer: for id in self.rows.iter() {
            for candidate in theirs.by_ref() {
                if candidate == id {
                    continue 'outer;
                }
                if candidate > id {
                    return false;
                }
            }
            return false;
        }
        true
    }

    /// Earliest and latest date, or `None` when empty.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.iter().map(|r| r.date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Owned copy of the rows in this view.
    pub fn to_records(&self) -> Vec<Record> {
        self.iter().cloned().collect()
    }
}
