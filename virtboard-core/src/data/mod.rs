//! Dataset ingestion, schema validation and synthetic data

pub mod ingest;
pub mod parquet;
pub mod schema;
pub mod synthetic;

pub use ingest::{load_records, records_from_csv, records_from_json, validate_records, DataError};
pub use parquet::{read_parquet, write_parquet};
pub use schema::{RecordSchema, SchemaError, RECORD_COLUMNS};
pub use synthetic::{generate, SyntheticSpec};
