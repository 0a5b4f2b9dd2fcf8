//! virtboard core — record domain types, views with row identity, ingestion.
//!
//! This crate holds everything the leaderboard engine needs that is not
//! engine state:
//! - Domain types (records, date ranges, group keys, dataset hashes)
//! - `RecordSet`, an immutable row-identity view over a shared row store
//! - Dataset ingestion from JSON, CSV and Parquet with schema validation
//! - Deterministic synthetic datasets

pub mod data;
pub mod domain;
pub mod record_set;

pub use domain::{DatasetHash, DateRange, GroupKey, ProfitColumn, RangeError, Record, RowId};
pub use record_set::RecordSet;
