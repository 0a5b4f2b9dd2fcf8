//! Export: views and chart series as CSV, summaries as CSV, JSON or a text table.
//!
//! Undefined ratios (NaN) are "no data": an empty CSV field, `null` in JSON
//! and `-` in the text table. They are never written as zero.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::leaderboard::Leaderboard;
use crate::series::GroupSeries;
use crate::summary::{Grouping, SummaryRow};
use crate::view::ViewKind;
use virtboard_core::data::RECORD_COLUMNS;
use virtboard_core::RecordSet;

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn ratio_field(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

// ─── Views ──────────────────────────────────────────────────────────

/// Serialize a view, one row per record, in row-id order.
pub fn export_records_csv(view: &RecordSet) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(RECORD_COLUMNS)?;

    for r in view.iter() {
        wtr.write_record([
            r.date.to_string(),
            r.policy.clone(),
            r.node.clone(),
            r.profit_total.to_string(),
            r.profit_short.to_string(),
            r.profit_long.to_string(),
            r.mwh_total.to_string(),
            r.win_count_long.to_string(),
            r.win_count_short.to_string(),
        ])?;
    }
    finish(wtr)
}

/// Write one of the engine's views to `path` as CSV.
pub fn save_view(board: &Leaderboard, kind: ViewKind, path: &Path) -> Result<()> {
    let view = board.view(kind);
    let csv = export_records_csv(view)?;
    std::fs::write(path, csv)
        .with_context(|| format!("failed to write {kind} view to {}", path.display()))?;
    info!(view = %kind, rows = view.len(), path = %path.display(), "view exported");
    Ok(())
}

// ─── Summaries ──────────────────────────────────────────────────────

fn key_columns(grouping: Grouping) -> &'static [&'static str] {
    match grouping {
        Grouping::Policy => &["policy"],
        Grouping::PolicyNode => &["policy", "node"],
    }
}

pub fn export_summary_csv(rows: &[SummaryRow], grouping: Grouping) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header: Vec<&str> = key_columns(grouping).to_vec();
    header.extend(["PnL", "per MWh", "win %"]);
    wtr.write_record(&header)?;

    for row in rows {
        let mut fields = vec![row.policy.clone()];
        if grouping.by_node() {
            fields.push(row.node.clone().unwrap_or_default());
        }
        fields.push(row.pnl.to_string());
        fields.push(ratio_field(row.per_mwh));
        fields.push(ratio_field(row.win_pct));
        wtr.write_record(&fields)?;
    }
    finish(wtr)
}

pub fn export_summary_json(rows: &[SummaryRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).context("failed to serialize summary to JSON")
}

/// Fixed-width text table for terminals.
pub fn summary_table(rows: &[SummaryRow], grouping: Grouping) -> String {
    let fmt_ratio = |v: f64| {
        if v.is_nan() {
            "-".to_string()
        } else {
            format!("{v:.2}")
        }
    };

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
    let mut header: Vec<String> = key_columns(grouping).iter().map(|c| c.to_string()).collect();
    header.extend(["PnL", "per MWh", "win %"].map(String::from));
    cells.push(header);
    for row in rows {
        let mut line = vec![row.policy.clone()];
        if grouping.by_node() {
            line.push(row.node.clone().unwrap_or_default());
        }
        line.push(format!("{:.2}", row.pnl));
        line.push(fmt_ratio(row.per_mwh));
        line.push(fmt_ratio(row.win_pct));
        cells.push(line);
    }

    let columns = cells[0].len();
    let keys = key_columns(grouping).len();
    let widths: Vec<usize> = (0..columns)
        .map(|c| cells.iter().map(|line| line[c].len()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for line in &cells {
        let mut text = String::new();
        for (c, cell) in line.iter().enumerate() {
            if c > 0 {
                text.push_str("  ");
            }
            // Key columns left-aligned, numbers right-aligned.
            if c < keys {
                let _ = write!(text, "{cell:<width$}", width = widths[c]);
            } else {
                let _ = write!(text, "{cell:>width$}", width = widths[c]);
            }
        }
        out.push_str(text.trim_end());
        out.push('\n');
    }
    out
}

// ─── Chart series ───────────────────────────────────────────────────

/// Long-format CSV: one line per (group, date) point.
pub fn export_series_csv(series: &[GroupSeries]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["policy", "node", "date", "cumulative"])?;
    for s in series {
        for p in &s.points {
            wtr.write_record([
                s.key.policy.clone(),
                s.key.node.clone().unwrap_or_default(),
                p.date.to_string(),
                p.value.to_string(),
            ])?;
        }
    }
    finish(wtr)
}
