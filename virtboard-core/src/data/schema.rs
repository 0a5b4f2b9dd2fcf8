use polars::prelude::*;

/// Column names of the record dataset, in canonical order.
pub const RECORD_COLUMNS: [&str; 9] = [
    "date",
    "policy",
    "node",
    "profit_total",
    "profit_short",
    "profit_long",
    "mwh_total",
    "win_count_long",
    "win_count_short",
];

/// Expected schema for record data
pub struct RecordSchema;

impl RecordSchema {
    /// Get the canonical record schema
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("date".into(), DataType::Date),
            Field::new("policy".into(), DataType::String),
            Field::new("node".into(), DataType::String),
            Field::new("profit_total".into(), DataType::Float64),
            Field::new("profit_short".into(), DataType::Float64),
            Field::new("profit_long".into(), DataType::Float64),
            Field::new("mwh_total".into(), DataType::Float64),
            Field::new("win_count_long".into(), DataType::UInt64),
            Field::new("win_count_short".into(), DataType::UInt64),
        ])
    }

    /// Validate that every required column exists.
    ///
    /// Dtypes are not compared here: numeric columns are cast on read, so an
    /// `Int64` profit column is acceptable. A failed cast surfaces later as
    /// [`SchemaError::TypeMismatch`].
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let actual = df.schema();
        for name in RECORD_COLUMNS {
            if !actual.contains(name) {
                return Err(SchemaError::MissingColumn(name.to_string()));
            }
        }
        Ok(())
    }

    /// Validate a header row (CSV) against the required columns.
    pub fn validate_header<'a>(
        header: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), SchemaError> {
        let present: Vec<&str> = header.into_iter().map(str::trim).collect();
        for name in RECORD_COLUMNS {
            if !present.contains(&name) {
                return Err(SchemaError::MissingColumn(name.to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_has_all_required_columns() {
        let schema = RecordSchema::schema();
        for name in RECORD_COLUMNS {
            assert!(schema.contains(name), "missing {name}");
        }
        assert_eq!(schema.len(), RECORD_COLUMNS.len());
    }

    #[test]
    fn test_validate_rejects_missing_column() {
        let df = DataFrame::new(vec![
            Column::new("policy".into(), &["A"]),
            Column::new("node".into(), &["n1"]),
        ])
        .unwrap();

        let result = RecordSchema::validate(&df);
        assert!(matches!(result, Err(SchemaError::MissingColumn(ref c)) if c == "date"));
    }

    #[test]
    fn test_validate_header() {
        assert!(RecordSchema::validate_header(RECORD_COLUMNS).is_ok());
        let err = RecordSchema::validate_header(["date", "policy"]).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(ref c) if c == "node"));
    }
}
