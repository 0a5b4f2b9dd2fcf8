//! virtboard CLI — leaderboard summaries, exports and an interactive session.
//!
//! Commands:
//! - `range` — first and last date of a dataset
//! - `summary` — the leaderboard after optional exclusions, window and top-N
//! - `export` — one of the original/excluded/window views as CSV
//! - `series` — cumulative profit per group, for plotting
//! - `session` — drive one board with line commands from stdin
//! - `synth` — write a deterministic synthetic dataset

mod output;
mod session;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use output::{render_summary, OutputFormat};
use session::Session;
use virtboard_core::data::{generate, load_records, write_parquet, SyntheticSpec};
use virtboard_core::{DateRange, ProfitColumn, Record};
use virtboard_engine::{
    cumulative_series, export_records_csv, export_series_csv, BoardConfig, Leaderboard, ViewKind,
};

#[derive(Parser)]
#[command(
    name = "virtboard",
    about = "virtboard — leaderboard analytics for virtual-bid trading policies"
)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Dataset and board setup shared by every command that reads data.
#[derive(Args)]
struct BoardArgs {
    /// Dataset file (.json, .csv or .parquet).
    #[arg(long)]
    data: PathBuf,

    /// Board defaults (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Exclude a date range (START:END, START..END or START/END; dates or timestamps), repeatable. Applied in order.
    #[arg(long)]
    exclude: Vec<DateRange>,

    /// Window bounds, in the same forms as --exclude.
    #[arg(long)]
    window: Option<DateRange>,

    /// Use the window instead of the full exclusion-filtered data.
    #[arg(long, default_value_t = false)]
    area: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the first and last date of the dataset.
    Range {
        /// Dataset file (.json, .csv or .parquet).
        #[arg(long)]
        data: PathBuf,
    },
    /// Print the leaderboard.
    Summary {
        #[command(flatten)]
        board: BoardArgs,

        /// Sort metric: PnL, per MWh or win %.
        #[arg(long)]
        metric: Option<String>,

        /// Keep the N best nodes per policy.
        #[arg(long)]
        topn: Option<usize>,

        /// One row per (policy, node) instead of per policy.
        #[arg(long, default_value_t = false)]
        by_node: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Write one view as CSV.
    Export {
        #[command(flatten)]
        board: BoardArgs,

        /// original, excluded or window.
        #[arg(long, default_value = "window")]
        view: ViewKind,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Cumulative profit per group as long-format CSV.
    Series {
        #[command(flatten)]
        board: BoardArgs,

        /// Profit column: total, short or long. Defaults to the configured chart column.
        #[arg(long)]
        column: Option<ProfitColumn>,

        #[arg(long, default_value_t = false)]
        by_node: bool,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Read control commands from stdin, one per line.
    Session {
        #[command(flatten)]
        board: BoardArgs,
    },
    /// Write a deterministic synthetic dataset.
    Synth {
        /// Output file (.parquet, .json or .csv).
        #[arg(long)]
        out: PathBuf,

        #[arg(long, default_value_t = 3)]
        policies: usize,

        #[arg(long, default_value_t = 5)]
        nodes: usize,

        /// First date (YYYY-MM-DD).
        #[arg(long, default_value = "2024-01-01")]
        start: String,

        /// Last date (YYYY-MM-DD).
        #[arg(long, default_value = "2024-03-29")]
        end: String,

        #[arg(long, default_value = "virtboard")]
        seed: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Range { data } => run_range(&data),
        Commands::Summary {
            board,
            metric,
            topn,
            by_node,
            format,
        } => run_summary(&board, metric.as_deref(), topn, by_node, format),
        Commands::Export { board, view, out } => run_export(&board, view, out.as_deref()),
        Commands::Series {
            board,
            column,
            by_node,
            out,
        } => run_series(&board, column, by_node, out.as_deref()),
        Commands::Session { board } => run_session(&board),
        Commands::Synth {
            out,
            policies,
            nodes,
            start,
            end,
            seed,
        } => run_synth(&out, policies, nodes, &start, &end, seed),
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let default_level = if verbose > 0 { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load(path: &Path) -> Result<Vec<Record>> {
    load_records(path).with_context(|| format!("failed to load dataset {}", path.display()))
}

/// Build a board and apply the command-line exclusions, window and area flag.
fn build_board(args: &BoardArgs) -> Result<Leaderboard> {
    let config = match &args.config {
        Some(path) => BoardConfig::from_file(path)?,
        None => BoardConfig::default(),
    };
    let mut board = Leaderboard::new(load(&args.data)?, &config)?;

    for range in &args.exclude {
        board.exclude(*range);
    }
    if let Some(window) = args.window {
        board.set_window_range(window);
    }
    if args.area && !board.is_area_only() {
        board.toggle_area_mode();
    }
    Ok(board)
}

fn write_output(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn run_range(data: &Path) -> Result<()> {
    let board = Leaderboard::new(load(data)?, &BoardConfig::default())?;
    let (first, last) = board.date_range()?;
    println!("{first} {last}");
    Ok(())
}

fn run_summary(
    args: &BoardArgs,
    metric: Option<&str>,
    topn: Option<usize>,
    by_node: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut board = build_board(args)?;
    if let Some(name) = metric {
        board.set_metric_named(name)?;
    }
    if topn.is_some() {
        board.set_topn_count(topn)?;
    }
    if by_node && board.grouping().is_policy_only() {
        board.toggle_grouping();
    }

    let rows = board.summarize();
    info!(
        rows = rows.len(),
        view_rows = board.active_view().len(),
        metric = %board.metric(),
        "summary computed"
    );
    write_output(&render_summary(&rows, board.grouping(), format)?, None)
}

fn run_export(args: &BoardArgs, view: ViewKind, out: Option<&Path>) -> Result<()> {
    let board = build_board(args)?;
    let csv = export_records_csv(board.view(view))?;
    info!(view = %view, rows = board.view(view).len(), "view exported");
    write_output(&csv, out)
}

fn run_series(
    args: &BoardArgs,
    column: Option<ProfitColumn>,
    by_node: bool,
    out: Option<&Path>,
) -> Result<()> {
    let mut board = build_board(args)?;
    if let Some(column) = column {
        board.set_chart_type(column);
    }
    let series = cumulative_series(board.active_view(), board.chart_type(), by_node);
    write_output(&export_series_csv(&series)?, out)
}

fn run_session(args: &BoardArgs) -> Result<()> {
    let board = build_board(args)?;
    let stdin = io::stdin();
    Session::new(board).run(stdin.lock(), io::stdout().lock())
}

fn synthetic_policies(count: usize) -> Vec<String> {
    let defaults = SyntheticSpec::default().policies;
    (0..count)
        .map(|i| {
            defaults
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("PJMvirts Policy {}", i + 1))
        })
        .collect()
}

fn run_synth(
    out: &Path,
    policies: usize,
    nodes: usize,
    start: &str,
    end: &str,
    seed: String,
) -> Result<()> {
    if policies == 0 || nodes == 0 {
        bail!("--policies and --nodes must be positive");
    }
    let range: DateRange = format!("{start}:{end}").parse()?;
    let spec = SyntheticSpec {
        policies: synthetic_policies(policies),
        nodes,
        range,
        seed,
    };
    let records = generate(&spec);

    let ext = out
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "parquet" => write_parquet(&records, out)?,
        "json" => std::fs::write(out, serde_json::to_string_pretty(&records)?)
            .with_context(|| format!("failed to write {}", out.display()))?,
        "csv" => {
            let view = virtboard_core::RecordSet::from_records(records.clone());
            std::fs::write(out, export_records_csv(&view)?)
                .with_context(|| format!("failed to write {}", out.display()))?
        }
        other => bail!("unsupported output format '{other}' (expected .parquet, .json or .csv)"),
    }

    info!(rows = records.len(), path = %out.display(), "synthetic dataset written");
    Ok(())
}
