//! Parquet I/O for record datasets.

use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::path::Path;

use super::ingest::DataError;
use super::schema::{RecordSchema, SchemaError};
use crate::domain::{parse_date, Record};

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Write records to a Parquet file (atomic: write to .tmp, then rename).
pub fn write_parquet(records: &[Record], path: &Path) -> Result<(), DataError> {
    let mut df = records_to_dataframe(records)?;
    let tmp_path = path.with_extension("parquet.tmp");

    let file = fs::File::create(&tmp_path)
        .map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::ParquetError(format!("atomic rename failed: {e}"))
    })
}

/// Read a Parquet file into records, validating the column set.
pub fn read_parquet(path: &Path) -> Result<Vec<Record>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    RecordSchema::validate(&df)?;
    dataframe_to_records(&df)
}

/// Convert records to a Polars DataFrame with the canonical schema.
pub fn records_to_dataframe(records: &[Record]) -> Result<DataFrame, DataError> {
    let epoch = epoch();
    let dates: Vec<i32> = records
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();
    let policies: Vec<&str> = records.iter().map(|r| r.policy.as_str()).collect();
    let nodes: Vec<&str> = records.iter().map(|r| r.node.as_str()).collect();
    let totals: Vec<f64> = records.iter().map(|r| r.profit_total).collect();
    let shorts: Vec<f64> = records.iter().map(|r| r.profit_short).collect();
    let longs: Vec<f64> = records.iter().map(|r| r.profit_long).collect();
    let mwh: Vec<f64> = records.iter().map(|r| r.mwh_total).collect();
    let wins_long: Vec<u64> = records.iter().map(|r| r.win_count_long).collect();
    let wins_short: Vec<u64> = records.iter().map(|r| r.win_count_short).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("policy".into(), policies),
        Column::new("node".into(), nodes),
        Column::new("profit_total".into(), totals),
        Column::new("profit_short".into(), shorts),
        Column::new("profit_long".into(), longs),
        Column::new("mwh_total".into(), mwh),
        Column::new("win_count_long".into(), wins_long),
        Column::new("win_count_short".into(), wins_short),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

/// Cast `name` to its canonical dtype, reporting a schema mismatch on failure.
fn cast_column(df: &DataFrame, schema: &Schema, name: &str) -> Result<Column, DataError> {
    let missing = || SchemaError::MissingColumn(name.to_string());
    let dtype = schema.get(name).ok_or_else(missing)?;
    let column = df.column(name).map_err(|_| missing())?;
    column.cast(dtype).map_err(|_| {
        DataError::Schema(SchemaError::TypeMismatch {
            column: name.to_string(),
            expected: dtype.clone(),
            actual: column.dtype().clone(),
        })
    })
}

/// Dates may be stored as Date, Datetime or ISO strings.
fn read_dates(df: &DataFrame, schema: &Schema) -> Result<Vec<NaiveDate>, DataError> {
    let column = df
        .column("date")
        .map_err(|_| SchemaError::MissingColumn("date".into()))?;

    if column.dtype() == &DataType::String {
        let ca = column
            .as_materialized_series()
            .str()
            .map_err(|e| DataError::ParquetError(format!("date column type: {e}")))?;
        return (0..ca.len())
            .map(|i| {
                ca.get(i)
                    .and_then(parse_date)
                    .ok_or_else(|| DataError::ParquetError(format!("invalid date at row {i}")))
            })
            .collect();
    }

    let as_date = cast_column(df, schema, "date")?;
    let ca = as_date
        .date()
        .map_err(|e| DataError::ParquetError(format!("date column type: {e}")))?;
    let epoch = epoch();
    (0..ca.len())
        .map(|i| {
            ca.get(i)
                .map(|days| epoch + chrono::Duration::days(days as i64))
                .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))
        })
        .collect()
}

/// Convert a DataFrame back to records.
pub fn dataframe_to_records(df: &DataFrame) -> Result<Vec<Record>, DataError> {
    let schema = RecordSchema::schema();
    let dates = read_dates(df, &schema)?;

    let policy_col = cast_column(df, &schema, "policy")?;
    let node_col = cast_column(df, &schema, "node")?;
    let total_col = cast_column(df, &schema, "profit_total")?;
    let short_col = cast_column(df, &schema, "profit_short")?;
    let long_col = cast_column(df, &schema, "profit_long")?;
    let mwh_col = cast_column(df, &schema, "mwh_total")?;
    let wl_col = cast_column(df, &schema, "win_count_long")?;
    let ws_col = cast_column(df, &schema, "win_count_short")?;

    let type_err = |e: PolarsError| DataError::ParquetError(format!("column type: {e}"));
    let policy_ca = policy_col.as_materialized_series().str().map_err(type_err)?;
    let node_ca = node_col.as_materialized_series().str().map_err(type_err)?;
    let total_ca = total_col.f64().map_err(type_err)?;
    let short_ca = short_col.f64().map_err(type_err)?;
    let long_ca = long_col.f64().map_err(type_err)?;
    let mwh_ca = mwh_col.f64().map_err(type_err)?;
    let wl_ca = wl_col.u64().map_err(type_err)?;
    let ws_ca = ws_col.u64().map_err(type_err)?;

    let null_at = |column: &str, i: usize| DataError::ParquetError(format!("null {column} at row {i}"));

    let mut records = Vec::with_capacity(df.height());
    for (i, date) in dates.into_iter().enumerate() {
        records.push(Record {
            date,
            policy: policy_ca.get(i).ok_or_else(|| null_at("policy", i))?.to_string(),
            node: node_ca.get(i).ok_or_else(|| null_at("node", i))?.to_string(),
            profit_total: total_ca.get(i).ok_or_else(|| null_at("profit_total", i))?,
            profit_short: short_ca.get(i).ok_or_else(|| null_at("profit_short", i))?,
            profit_long: long_ca.get(i).ok_or_else(|| null_at("profit_long", i))?,
            mwh_total: mwh_ca.get(i).ok_or_else(|| null_at("mwh_total", i))?,
            win_count_long: wl_ca.get(i).ok_or_else(|| null_at("win_count_long", i))?,
            win_count_short: ws_ca.get(i).ok_or_else(|| null_at("win_count_short", i))?,
        });
    }
    Ok(records)
}
