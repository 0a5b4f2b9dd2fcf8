use anyhow::Result;
use clap::ValueEnum;

use virtboard_engine::{export_summary_csv, export_summary_json, summary_table, Grouping, SummaryRow};

/// How summaries are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

pub fn render_summary(rows: &[SummaryRow], grouping: Grouping, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(summary_table(rows, grouping)),
        OutputFormat::Csv => export_summary_csv(rows, grouping),
        OutputFormat::Json => export_summary_json(rows).map(|mut s| {
            s.push('\n');
            s
        }),
    }
}
