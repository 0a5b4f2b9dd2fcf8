//! Dataset ingestion: JSON, CSV and Parquet into validated `Record`s.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::parquet::read_parquet;
use super::schema::{RecordSchema, SchemaError};
use crate::domain::{parse_date, Record};

/// Structured error types for dataset ingestion.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("unsupported dataset format '{0}' (expected .json, .csv or .parquet)")]
    UnsupportedFormat(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),
}

/// Load a dataset, choosing the reader from the file extension.
pub fn load_records(path: &Path) -> Result<Vec<Record>, DataError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let io_err = |e: std::io::Error| DataError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let records = match ext.as_str() {
        "json" => records_from_json(&fs::read_to_string(path).map_err(io_err)?)?,
        "csv" => records_from_csv(fs::File::open(path).map_err(io_err)?)?,
        "parquet" => read_parquet(path)?,
        other => return Err(DataError::UnsupportedFormat(other.to_string())),
    };

    validate_records(&records)?;
    Ok(records)
}

/// Column-oriented JSON: `{ "date": [...], "policy": [...], ... }`.
#[derive(Deserialize)]
struct ColumnarRecords {
    date: Vec<String>,
    policy: Vec<String>,
    node: Vec<String>,
    profit_total: Vec<f64>,
    profit_short: Vec<f64>,
    profit_long: Vec<f64>,
    mwh_total: Vec<f64>,
    win_count_long: Vec<f64>,
    win_count_short: Vec<f64>,
}

impl ColumnarRecords {
    fn into_records(self) -> Result<Vec<Record>, DataError> {
        let n = self.date.len();
        let lengths = [
            self.policy.len(),
            self.node.len(),
            self.profit_total.len(),
            self.profit_short.len(),
            self.profit_long.len(),
            self.mwh_total.len(),
            self.win_count_long.len(),
            self.win_count_short.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(DataError::ValidationError(
                "column-oriented JSON has columns of different lengths".into(),
            ));
        }

        let mut records = Vec::with_capacity(n);
        for i in 0..n {
            let date = parse_date(&self.date[i]).ok_or_else(|| {
                DataError::Parse(format!("invalid date '{}' at row {i}", self.date[i]))
            })?;
            records.push(Record {
                date,
                policy: self.policy[i].clone(),
                node: self.node[i].clone(),
                profit_total: self.profit_total[i],
                profit_short: self.profit_short[i],
                profit_long: self.profit_long[i],
                mwh_total: self.mwh_total[i],
                win_count_long: to_count(self.win_count_long[i], "win_count_long", i)?,
                win_count_short: to_count(self.win_count_short[i], "win_count_short", i)?,
            });
        }
        Ok(records)
    }
}

fn to_count(x: f64, column: &str, row: usize) -> Result<u64, DataError> {
    if x.is_finite() && x >= 0.0 && x.fract() == 0.0 {
        Ok(x as u64)
    } else {
        Err(DataError::ValidationError(format!(
            "{column} at row {row} is not a non-negative integer: {x}"
        )))
    }
}

/// Parse JSON in either row-oriented (array of objects) or column-oriented form.
pub fn records_from_json(text: &str) -> Result<Vec<Record>, DataError> {
    let value: Value = serde_json::from_str(text).map_err(|e| DataError::Parse(e.to_string()))?;
    match value {
        Value::Array(_) => {
            serde_json::from_value(value).map_err(|e| DataError::Parse(e.to_string()))
        }
        Value::Object(_) => {
            let columns: ColumnarRecords =
                serde_json::from_value(value).map_err(|e| DataError::Parse(e.to_string()))?;
            columns.into_records()
        }
        _ => Err(DataError::Parse(
            "expected a JSON array of rows or an object of columns".into(),
        )),
    }
}

/// Parse CSV with a header row naming the record columns (any order).
pub fn records_from_csv<R: Read>(reader: R) -> Result<Vec<Record>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| DataError::Parse(format!("csv header: {e}")))?
        .clone();
    RecordSchema::validate_header(headers.iter())?;

    let mut records = Vec::new();
    for (i, row) in rdr.deserialize::<Record>().enumerate() {
        let record = row.map_err(|e| DataError::Parse(format!("csv row {}: {e}", i + 1)))?;
        records.push(record);
    }
    Ok(records)
}

/// Reject rows the aggregation cannot interpret.
///
/// Profits may be any finite value. Volume must be finite and non-negative.
pub fn validate_records(records: &[Record]) -> Result<(), DataError> {
    for (i, r) in records.iter().enumerate() {
        if !(r.mwh_total.is_finite() && r.mwh_total >= 0.0) {
            return Err(DataError::ValidationError(format!(
                "row {i}: mwh_total must be a non-negative number, got {}",
                r.mwh_total
            )));
        }
        let profits = [r.profit_total, r.profit_short, r.profit_long];
        if profits.iter().any(|p| !p.is_finite()) {
            return Err(DataError::ValidationError(format!(
                "row {i}: profit columns must be finite"
            )));
        }
        if r.policy.is_empty() || r.node.is_empty() {
            return Err(DataError::ValidationError(format!(
                "row {i}: policy and node must be non-empty"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const ROWS_JSON: &str = r#"[
        {"date":"2024-01-01","policy":"A","node":"n1","profit_total":100.0,
         "profit_short":40.0,"profit_long":60.0,"mwh_total":10.0,
         "win_count_long":1,"win_count_short":0},
        {"date":"2024-01-02","policy":"A","node":"n2","profit_total":-50.0,
         "profit_short":-50.0,"profit_long":0.0,"mwh_total":5.0,
         "win_count_long":0,"win_count_short":0}
    ]"#;

    #[test]
    fn parses_row_oriented_json() {
        let records = records_from_json(ROWS_JSON).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(records[1].profit_total, -50.0);
    }

    #[test]
    fn parses_column_oriented_json() {
        let json = r#"{
            "date": ["2024-01-01", "2024-01-02"],
            "policy": ["A", "B"],
            "node": ["n1", "n2"],
            "profit_total": [1.0, 2.0],
            "profit_short": [0.5, 1.0],
            "profit_long": [0.5, 1.0],
            "mwh_total": [3.0, 4.0],
            "win_count_long": [1, 0],
            "win_count_short": [0, 2]
        }"#;
        let records = records_from_json(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].policy, "B");
        assert_eq!(records[1].win_count_short, 2);
    }

    #[test]
    fn column_oriented_length_mismatch_is_rejected() {
        let json = r#"{
            "date": ["2024-01-01"], "policy": ["A", "B"], "node": ["n1"],
            "profit_total": [1.0], "profit_short": [0.5], "profit_long": [0.5],
            "mwh_total": [3.0], "win_count_long": [1], "win_count_short": [0]
        }"#;
        assert!(matches!(
            records_from_json(json),
            Err(DataError::ValidationError(_))
        ));
    }

    #[test]
    fn json_missing_field_is_parse_error() {
        let json = r#"[{"date":"2024-01-01","policy":"A"}]"#;
        assert!(matches!(records_from_json(json), Err(DataError::Parse(_))));
    }

    #[test]
    fn parses_csv_in_any_column_order() {
        let csv = "policy,node,date,profit_total,profit_short,profit_long,mwh_total,win_count_long,win_count_short\n\
                   A,n1,2024-01-01,100,40,60,10,1,0\n\
                   A,n2,2024-01-02,-50,-50,0,5,0,0\n";
        let records = records_from_csv(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].node, "n1");
        assert_eq!(records[0].win_count_long, 1);
        assert_eq!(records[1].mwh_total, 5.0);
    }

    #[test]
    fn csv_missing_column_is_schema_error() {
        let csv = "date,policy,node\n2024-01-01,A,n1\n";
        assert!(matches!(
            records_from_csv(csv.as_bytes()),
            Err(DataError::Schema(SchemaError::MissingColumn(_)))
        ));
    }

    #[test]
    fn validation_rejects_negative_volume() {
        let mut records = records_from_json(ROWS_JSON).unwrap();
        records[1].mwh_total = -1.0;
        assert!(matches!(
            validate_records(&records),
            Err(DataError::ValidationError(_))
        ));
    }

    #[test]
    fn validation_accepts_zero_volume() {
        let mut records = records_from_json(ROWS_JSON).unwrap();
        records[0].mwh_total = 0.0;
        assert!(validate_records(&records).is_ok());
    }

    #[test]
    fn unsupported_extension() {
        let err = load_records(Path::new("data.xlsx")).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedFormat(ref e) if e == "xlsx"));
    }
}
