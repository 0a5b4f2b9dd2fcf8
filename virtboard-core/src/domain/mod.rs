//! Domain types for virtboard

pub mod ids;
pub mod range;
pub mod record;

pub use ids::{DatasetHash, GroupKey, RowId};
pub use range::{split_bounds, DateRange, RangeError};
pub use record::{parse_date, ProfitColumn, Record};
