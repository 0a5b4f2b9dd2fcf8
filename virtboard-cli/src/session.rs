//! Line-oriented control surface over one leaderboard.
//!
//! Each input line is one command. A failed command prints an error and
//! leaves the board untouched; the session keeps going.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use tracing::debug;

use crate::output::{render_summary, OutputFormat};
use virtboard_core::domain::{parse_date, split_bounds};
use virtboard_core::ProfitColumn;
use virtboard_engine::{export_records_csv, save_view, Leaderboard, ViewKind};

pub const HELP: &str = "\
commands:
  exclude START END        drop rows dated START..=END (also START:END, START..END)
  window START END         set the window (aliases: zoom, pan)
  toggle-area              switch between the excluded and windowed view
  toggle-grouping          switch between policy and policy/node rows
  topn N | none            keep the N best nodes per policy
  metric NAME              PnL | per MWh | win %
  chart total|short|long   profit column for chart series
  summary [table|csv|json] print the leaderboard
  range                    first and last date of the dataset
  export VIEW [PATH]       original | excluded | window, as CSV
  state                    engine state as JSON
  reset                    rebuild from the original dataset
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Exclude(NaiveDate, NaiveDate),
    Window(NaiveDate, NaiveDate),
    ToggleArea,
    ToggleGrouping,
    TopN(Option<usize>),
    Metric(String),
    Chart(ProfitColumn),
    Summary(OutputFormat),
    Range,
    Export(ViewKind, Option<PathBuf>),
    State,
    Reset,
    Help,
    Quit,
}

/// Dates as `START END`, `START:END`, `START..END` or `START/END`; either
/// bound may be a timestamp. Order is not checked here; the board rejects
/// inverted ranges.
fn parse_bounds(args: &[&str]) -> Result<(NaiveDate, NaiveDate)> {
    match args {
        [a, b] => {
            let date = |s: &str| parse_date(s).ok_or_else(|| anyhow!("invalid date '{s}'"));
            Ok((date(a)?, date(b)?))
        }
        [joined] => split_bounds(joined).ok_or_else(|| anyhow!("expected START END, got '{joined}'")),
        _ => bail!("expected START END"),
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let args: Vec<&str> = words.collect();

        let command = match name.to_ascii_lowercase().as_str() {
            "exclude" => {
                let (start, end) = parse_bounds(&args)?;
                Command::Exclude(start, end)
            }
            "window" | "zoom" | "pan" => {
                let (start, end) = parse_bounds(&args)?;
                Command::Window(start, end)
            }
            "toggle-area" | "area" => Command::ToggleArea,
            "toggle-grouping" | "grouping" => Command::ToggleGrouping,
            "topn" => match args.as_slice() {
                ["none"] | ["off"] => Command::TopN(None),
                [n] => Command::TopN(Some(
                    n.parse().with_context(|| format!("invalid top-N '{n}'"))?,
                )),
                _ => bail!("usage: topn N | none"),
            },
            "metric" => {
                if args.is_empty() {
                    bail!("usage: metric NAME");
                }
                Command::Metric(args.join(" "))
            }
            "chart" => match args.as_slice() {
                [column] => Command::Chart(column.parse().map_err(|e: String| anyhow!(e))?),
                _ => bail!("usage: chart total|short|long"),
            },
            "summary" => match args.as_slice() {
                [] => Command::Summary(OutputFormat::Table),
                [format] => Command::Summary(
                    OutputFormat::from_str(format, true).map_err(|e| anyhow!(e))?,
                ),
                _ => bail!("usage: summary [table|csv|json]"),
            },
            "range" => Command::Range,
            "export" => match args.as_slice() {
                [view] => Command::Export(view.parse().map_err(|e: String| anyhow!(e))?, None),
                [view, path] => Command::Export(
                    view.parse().map_err(|e: String| anyhow!(e))?,
                    Some(PathBuf::from(path)),
                ),
                _ => bail!("usage: export VIEW [PATH]"),
            },
            "state" => Command::State,
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(command)
    }
}

pub struct Session {
    board: Leaderboard,
}

impl Session {
    pub fn new(board: Leaderboard) -> Self {
        Self { board }
    }

    pub fn board(&self) -> &Leaderboard {
        &self.board
    }

    /// Apply one command and return what should be printed.
    pub fn execute(&mut self, command: Command) -> Result<String> {
        debug!(?command, "session command");
        let board = &mut self.board;
        let reply = match command {
            Command::Exclude(start, end) => {
                let removed = board.exclude_region(start, end)?;
                format!(
                    "excluded {removed} rows; {} remain, {} in window",
                    board.view(ViewKind::Excluded).len(),
                    board.view(ViewKind::Window).len()
                )
            }
            Command::Window(start, end) => {
                board.set_window(start, end)?;
                format!(
                    "window {}; {} rows",
                    board.window_range(),
                    board.view(ViewKind::Window).len()
                )
            }
            Command::ToggleArea => {
                board.toggle_area_mode();
                format!("area only: {}", board.is_area_only())
            }
            Command::ToggleGrouping => {
                board.toggle_grouping();
                format!("policy only: {}", board.grouping().is_policy_only())
            }
            Command::TopN(n) => {
                board.set_topn_count(n)?;
                match board.topn() {
                    Some(n) => format!("top-N: {n}"),
                    None => "top-N: off".to_string(),
                }
            }
            Command::Metric(name) => {
                board.set_metric_named(&name)?;
                format!("metric: {}", board.metric())
            }
            Command::Chart(column) => {
                board.set_chart_type(column);
                format!("chart: {column}")
            }
            Command::Summary(format) => {
                let rows = board.summarize();
                render_summary(&rows, board.grouping(), format)?
                    .trim_end()
                    .to_string()
            }
            Command::Range => {
                let (first, last) = board.date_range()?;
                format!("{first} {last}")
            }
            Command::Export(view, None) => export_records_csv(board.view(view))?
                .trim_end()
                .to_string(),
            Command::Export(view, Some(path)) => {
                save_view(board, view, &path)?;
                format!("wrote {view} view to {}", path.display())
            }
            Command::State => serde_json::to_string_pretty(&board.state())?,
            Command::Reset => {
                board.reset();
                "reset".to_string()
            }
            Command::Help => HELP.to_string(),
            Command::Quit => String::new(),
        };
        Ok(reply)
    }

    /// Read commands until end of input or `quit`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("failed to read command")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => match self.execute(command) {
                    Ok(reply) => writeln!(out, "{reply}")?,
                    Err(e) => writeln!(out, "error: {e:#}")?,
                },
                Err(e) => writeln!(out, "error: {e:#}")?,
            }
            out.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use virtboard_core::Record;
    use virtboard_engine::SortMetric;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn rec(day: u32, policy: &str, node: &str, profit: f64, mwh: f64) -> Record {
        Record {
            date: d(day),
            policy: policy.into(),
            node: node.into(),
            profit_total: profit,
            profit_short: 0.0,
            profit_long: profit,
            mwh_total: mwh,
            win_count_long: 1,
            win_count_short: 0,
        }
    }

    fn session() -> Session {
        Session::new(Leaderboard::from_records(vec![
            rec(1, "A", "n1", 100.0, 10.0),
            rec(2, "A", "n2", -50.0, 5.0),
            rec(3, "B", "n1", 20.0, 0.0),
        ]))
    }

    fn run(session: &mut Session, script: &str) -> String {
        let mut out = Vec::new();
        session.run(Cursor::new(script), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_command_forms() {
        assert_eq!(
            "exclude 2024-01-02 2024-01-03".parse::<Command>().unwrap(),
            Command::Exclude(d(2), d(3))
        );
        assert_eq!(
            "zoom 2024-01-02:2024-01-03".parse::<Command>().unwrap(),
            Command::Window(d(2), d(3))
        );
        assert_eq!("topn none".parse::<Command>().unwrap(), Command::TopN(None));
        assert_eq!("topn 3".parse::<Command>().unwrap(), Command::TopN(Some(3)));
        assert_eq!(
            "metric per MWh".parse::<Command>().unwrap(),
            Command::Metric("per MWh".into())
        );
        assert_eq!(
            "summary CSV".parse::<Command>().unwrap(),
            Command::Summary(OutputFormat::Csv)
        );
        assert_eq!(
            "export window".parse::<Command>().unwrap(),
            Command::Export(ViewKind::Window, None)
        );
        assert_eq!(
            "exclude 2024-01-02T00:00:00:2024-01-03T18:00:00".parse::<Command>().unwrap(),
            Command::Exclude(d(2), d(3))
        );
        assert_eq!(
            "pan 2024-01-03..2024-01-02T09:15:00".parse::<Command>().unwrap(),
            Command::Window(d(3), d(2))
        );
        assert!("frobnicate".parse::<Command>().is_err());
        assert!("exclude 2024-01-02".parse::<Command>().is_err());
        assert!("chart sideways".parse::<Command>().is_err());
    }

    #[test]
    fn exclusion_then_summary() {
        let mut s = session();
        let out = run(&mut s, "exclude 2024-01-02 2024-01-02\nsummary csv\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "excluded 1 rows; 2 remain, 2 in window");
        assert_eq!(lines[1], "policy,PnL,per MWh,win %");
        assert_eq!(lines[2], "A,100,10,10");
        assert_eq!(lines[3], "B,20,,");
    }

    #[test]
    fn errors_leave_state_and_continue() {
        let mut s = session();
        let before = s.board().state();
        let out = run(
            &mut s,
            "exclude 2024-01-03 2024-01-01\nmetric sharpe\ntopn 0\nwindow 2024-01-05 2024-01-01\nrange\n",
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[..4].iter().all(|l| l.starts_with("error: ")));
        assert_eq!(lines[4], "2024-01-01 2024-01-03");
        assert_eq!(s.board().state(), before);
    }

    #[test]
    fn quit_stops_reading() {
        let mut s = session();
        let out = run(&mut s, "# comment\n\nmetric win %\nquit\ntoggle-area\n");
        assert_eq!(out.trim(), "metric: win %");
        assert_eq!(s.board().metric(), SortMetric::WinPct);
        assert!(!s.board().is_area_only());
    }

    #[test]
    fn toggles_and_reset() {
        let mut s = session();
        run(&mut s, "window 2024-01-03 2024-01-03\ntoggle-area\ntoggle-grouping\nchart short\n");
        assert!(s.board().is_area_only());
        assert_eq!(s.board().active_view().len(), 1);
        assert_eq!(s.board().chart_type(), ProfitColumn::Short);

        run(&mut s, "reset\n");
        assert!(!s.board().is_area_only());
        assert_eq!(s.board().active_view().len(), 3);
    }

    #[test]
    fn export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("excluded.csv");
        let mut s = session();
        let out = run(&mut s, &format!("exclude 2024-01-01:2024-01-01\nexport excluded {}\n", path.display()));
        assert!(out.lines().nth(1).unwrap().starts_with("wrote excluded view"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
