//! Deterministic synthetic datasets for demos, benches and tests.
//!
//! Rows are generated for every weekday in the range, for every policy and
//! every node. The RNG is seeded from the BLAKE3 hash of the seed label, so
//! the same spec always yields the same dataset.

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{DateRange, Record};

/// What to generate.
#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub policies: Vec<String>,
    pub nodes: usize,
    pub range: DateRange,
    pub seed: String,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN);
        let end = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap_or(NaiveDate::MIN);
        Self {
            policies: vec![
                "PJMvirts Captain Hindsight".into(),
                "PJMvirts Pricetaker Short".into(),
                "PJMvirts Pricetaker Long".into(),
            ],
            nodes: 5,
            range: DateRange::new(start, end).unwrap_or_else(|_| DateRange::day(start)),
            seed: "virtboard".into(),
        }
    }
}

/// Node identifiers shared by every policy.
pub fn node_name(index: usize) -> String {
    format!("PJM-{index:03}")
}

pub fn generate(spec: &SyntheticSpec) -> Vec<Record> {
    let seed: [u8; 32] = *blake3::hash(spec.seed.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut records = Vec::new();
    let mut current = spec.range.start();
    while current <= spec.range.end() {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            for policy in &spec.policies {
                for n in 0..spec.nodes {
                    records.push(synthetic_row(&mut rng, current, policy, n));
                }
            }
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    records
}

fn synthetic_row(rng: &mut StdRng, date: NaiveDate, policy: &str, node: usize) -> Record {
    // Roughly one day in ten has no cleared volume at a node.
    let mwh_total: f64 = if rng.gen_bool(0.1) {
        0.0
    } else {
        (rng.gen_range(1.0..80.0_f64) * 10.0).round() / 10.0
    };
    let per_mwh_edge: f64 = rng.gen_range(-4.0..4.5);
    let long_share: f64 = rng.gen_range(0.0..1.0);

    let profit_total = (mwh_total * per_mwh_edge * 100.0).round() / 100.0;
    let profit_long = (profit_total * long_share * 100.0).round() / 100.0;
    let profit_short = ((profit_total - profit_long) * 100.0).round() / 100.0;

    let max_wins = (mwh_total / 10.0).ceil() as u64;
    let win_count_long = if max_wins == 0 { 0 } else { rng.gen_range(0..=max_wins) };
    let win_count_short = if max_wins == 0 { 0 } else { rng.gen_range(0..=max_wins) };

    Record {
        date,
        policy: policy.to_string(),
        node: node_name(node),
        profit_total,
        profit_short,
        profit_long,
        mwh_total,
        win_count_long,
        win_count_short,
    }
}
