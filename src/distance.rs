//! Normalized distances between rankings.

use crate::error::ModelError;
use crate::ranking::argsort;
use serde::{Deserialize, Serialize};

/// Dissimilarity measure used to compare two rank vectors.
///
/// Both variants return a value in `[0, 1]`, where `0` means the rankings agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    KendallTau,
    Spearman,
}

impl DistanceMetric {
    /// Normalized distance between two rank vectors.
    ///
    /// `pairs` must be the search pairs for the length of the rank vectors.
    pub fn distance(
        &self,
        ranks_1: &[f64],
        ranks_2: &[f64],
        pairs: &[(usize, usize)],
    ) -> Result<f64, ModelError> {
        match self {
            Self::KendallTau => kendall_tau(ranks_1, ranks_2, pairs),
            Self::Spearman => spearman(ranks_1, ranks_2),
        }
    }
}

/// Number of pairwise disagreements between two rank vectors.
///
/// Both rank vectors are turned into orderings; the second ordering is
/// relabeled so that the first one becomes `0..n`, which leaves only the
/// inversions of the relabeled ordering to be counted.
pub fn kendall_inversions(
    ranks_1: &[f64],
    ranks_2: &[f64],
    pairs: &[(usize, usize)],
) -> Result<usize, ModelError> {
    check_len(ranks_1, ranks_2)?;
    let n = ranks_1.len();
    let expected = n * n.saturating_sub(1) / 2;
    if pairs.len() != expected {
        return Err(ModelError::PairsMismatch {
            expected,
            actual: pairs.len(),
        });
    }

    let ordering_1 = argsort(ranks_1);
    let ordering_2 = argsort(ranks_2);

    let mut mapping = vec![0; n];
    for (new_label, &old_label) in ordering_1.iter().enumerate() {
        mapping[old_label] = new_label;
    }
    let renamed: Vec<usize> = ordering_2.iter().map(|&label| mapping[label]).collect();

    let inversions = pairs
        .iter()
        .filter(|&&(i, j)| renamed[i] > renamed[j])
        .count();
    Ok(inversions)
}

fn kendall_tau(
    ranks_1: &[f64],
    ranks_2: &[f64],
    pairs: &[(usize, usize)],
) -> Result<f64, ModelError> {
    let inversions = kendall_inversions(ranks_1, ranks_2, pairs)?;
    let max_inversions = pairs.len();
    if max_inversions == 0 {
        return Ok(0.0);
    }
    Ok(inversions as f64 / max_inversions as f64)
}

/// Spearman's footrule: sum of absolute rank differences (not normalized).
pub fn footrule(ranks_1: &[f64], ranks_2: &[f64]) -> Result<f64, ModelError> {
    check_len(ranks_1, ranks_2)?;
    if !ranks_1.is_empty() {
        let (min_1, max_1) = bounds(ranks_1);
        let (min_2, max_2) = bounds(ranks_2);
        if min_1 != min_2 || max_1 != max_2 {
            return Err(ModelError::Incomparable {
                left: ranks_1.to_vec(),
                right: ranks_2.to_vec(),
            });
        }
    }
    Ok(ranks_1
        .iter()
        .zip(ranks_2)
        .map(|(a, b)| (a - b).abs())
        .sum())
}

fn spearman(ranks_1: &[f64], ranks_2: &[f64]) -> Result<f64, ModelError> {
    let dist = footrule(ranks_1, ranks_2)?;
    let n = ranks_1.len();
    // Largest footrule between two permutations of n labels.
    let max_dist = ((n * n - n % 2) / 2) as f64;
    if max_dist == 0.0 {
        return Ok(0.0);
    }
    Ok((dist / max_dist).min(1.0))
}

fn check_len(ranks_1: &[f64], ranks_2: &[f64]) -> Result<(), ModelError> {
    if ranks_1.len() != ranks_2.len() {
        return Err(ModelError::LengthMismatch {
            left: ranks_1.len(),
            right: ranks_2.len(),
        });
    }
    Ok(())
}

fn bounds(vals: &[f64]) -> (f64, f64) {
    vals.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
