//! Social welfare functions.
//!
//! A preference table has one row per voting agent and one column per option.
//! Its entries are disagreement values: the lower the value, the more the
//! agent prefers the option. Every rule returns a complete ranking of the
//! options, most preferred first, even when some options receive no support.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Larger values add less tie-breaking noise in the majority rule.
const NOISE_FACTOR: f64 = 100.0;

/// Voting rule used to aggregate a preference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregator {
    MajorityRule,
    ApprovalVoting,
}

impl Aggregator {
    /// Aggregate `pref_table` into a ranking of `n_opts` options.
    ///
    /// Callers are expected to skip the election instead of passing an empty table.
    pub fn aggregate<R: Rng + ?Sized>(
        &self,
        pref_table: &[Vec<f64>],
        n_opts: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        debug_assert!(!pref_table.is_empty(), "empty preference table");
        debug_assert!(pref_table.iter().all(|row| row.len() == n_opts));
        match self {
            Self::MajorityRule => majority_rule(pref_table, n_opts, rng),
            Self::ApprovalVoting => approval_voting(pref_table, n_opts, rng),
        }
    }
}

/// Plurality ranking of the agents' first choices.
pub fn majority_rule<R: Rng + ?Sized>(
    pref_table: &[Vec<f64>],
    n_opts: usize,
    rng: &mut R,
) -> Vec<usize> {
    // Noise scaled to each column's variance breaks exact ties without
    // shifting any clear preference.
    let noise_eps: Vec<f64> = (0..n_opts)
        .map(|opt| (column_variance(pref_table, opt) + 1e-10) / NOISE_FACTOR)
        .collect();

    let mut first_choices: Vec<usize> = pref_table
        .iter()
        .map(|row| {
            let mut best = 0;
            let mut best_val = f64::INFINITY;
            for (opt, &val) in row.iter().enumerate() {
                let noisy = val + rng.random_range(-noise_eps[opt]..noise_eps[opt]);
                if noisy < best_val {
                    best = opt;
                    best_val = noisy;
                }
            }
            best
        })
        .collect();

    // Tally in random ballot order so count ties are not biased toward
    // agents (or options) with low indices.
    first_choices.shuffle(rng);
    let mut counts = vec![0usize; n_opts];
    let mut ranking = Vec::with_capacity(n_opts);
    for choice in first_choices {
        if counts[choice] == 0 {
            ranking.push(choice);
        }
        counts[choice] += 1;
    }
    ranking.sort_by(|&a, &b| counts[b].cmp(&counts[a]));

    complete_ranking(ranking, n_opts, rng)
}

/// Ranking by the number of agents approving each option.
///
/// An agent approves every option whose disagreement lies within one
/// standard deviation of its best option.
pub fn approval_voting<R: Rng + ?Sized>(
    pref_table: &[Vec<f64>],
    n_opts: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut approvals = vec![0.0; n_opts];
    for row in pref_table {
        let threshold = row.iter().copied().fold(f64::INFINITY, f64::min) + variance(row).sqrt();
        for (opt, &val) in row.iter().enumerate() {
            if val <= threshold {
                approvals[opt] += 1.0;
            }
        }
    }

    // Noise below one vote only reorders options with equal counts.
    let scores: Vec<f64> = approvals
        .iter()
        .map(|count| count + rng.random_range(0.0..0.5))
        .collect();

    let mut ranking: Vec<usize> = (0..n_opts).collect();
    ranking.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    ranking
}

/// Append the options missing from `ranking` in random order.
pub fn complete_ranking<R: Rng + ?Sized>(
    mut ranking: Vec<usize>,
    n_opts: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut included = vec![false; n_opts];
    for &opt in &ranking {
        included[opt] = true;
    }
    let mut missing: Vec<usize> = (0..n_opts).filter(|&opt| !included[opt]).collect();
    missing.shuffle(rng);
    ranking.extend(missing);
    ranking
}

fn column_variance(pref_table: &[Vec<f64>], opt: usize) -> f64 {
    let column: Vec<f64> = pref_table.iter().map(|row| row[opt]).collect();
    variance(&column)
}

fn variance(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return 0.0;
    }
    let n = vals.len() as f64;
    let mean = vals.iter().sum::<f64>() / n;
    vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
