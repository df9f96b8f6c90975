//! Orderings, rank vectors and the option space.
//!
//! An *ordering* lists color ids from most to least preferred (index = rank).
//! A *rank vector* is its inverse (index = color id, value = rank).

use serde::{Deserialize, Serialize};

/// Every ranking of the colors that can be voted for.
///
/// Options are indexed `0..n!` in lexicographic order of their orderings.
/// The search pairs are shared by every distance computation of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpace {
    orderings: Vec<Vec<usize>>,
    ranks: Vec<Vec<f64>>,
    pairs: Vec<(usize, usize)>,
}

impl OptionSpace {
    /// Build the option space over `n_colors` colors.
    pub fn new(n_colors: usize) -> Self {
        let orderings = all_orderings(n_colors);
        let ranks = orderings.iter().map(|ord| ordering_to_ranks(ord)).collect();
        let pairs = search_pairs(n_colors);
        Self {
            orderings,
            ranks,
            pairs,
        }
    }

    pub fn len(&self) -> usize {
        self.orderings.len()
    }

    pub fn ordering(&self, option: usize) -> &[usize] {
        &self.orderings[option]
    }

    pub fn ranks(&self) -> &[Vec<f64>] {
        &self.ranks
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }
}

/// All permutations of `0..n`, in lexicographic order.
pub fn all_orderings(n: usize) -> Vec<Vec<usize>> {
    let mut perm: Vec<usize> = (0..n).collect();
    let mut orderings = vec![perm.clone()];
    while next_permutation(&mut perm) {
        orderings.push(perm.clone());
    }
    orderings
}

fn next_permutation(perm: &mut [usize]) -> bool {
    // Find the rightmost ascent.
    let Some(i) = (1..perm.len()).rev().find(|&i| perm[i - 1] < perm[i]) else {
        return false;
    };
    let pivot = i - 1;
    let Some(j) = (i..perm.len()).rev().find(|&j| perm[j] > perm[pivot]) else {
        return false;
    };
    perm.swap(pivot, j);
    perm[i..].reverse();
    true
}

/// All index pairs `(i, j)` with `i < j < n`.
pub fn search_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            pairs.push((i, j));
        }
    }
    pairs
}

/// Invert an ordering into its rank vector.
pub fn ordering_to_ranks(ordering: &[usize]) -> Vec<f64> {
    let mut ranks = vec![0.0; ordering.len()];
    for (rank, &color) in ordering.iter().enumerate() {
        ranks[color] = rank as f64;
    }
    ranks
}

/// Indices that sort `vals` ascending. Stable, so equal values keep index order.
pub fn argsort(vals: &[f64]) -> Vec<usize> {
    let mut idxs: Vec<usize> = (0..vals.len()).collect();
    idxs.sort_by(|&a, &b| vals[a].total_cmp(&vals[b]));
    idxs
}

/// Ordering of the colors by descending weight (ties keep color order).
pub fn ordering_by_weight(weights: &[f64]) -> Vec<usize> {
    let mut idxs: Vec<usize> = (0..weights.len()).collect();
    idxs.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]));
    idxs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_space_holds_every_permutation() {
        let space = OptionSpace::new(4);
        assert_eq!(space.len(), 24);
        assert_eq!(space.ordering(0), &[0, 1, 2, 3]);
        assert_eq!(space.ordering(23), &[3, 2, 1, 0]);
        assert_eq!(space.pairs().len(), 6);

        let mut seen = space.orderings.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn degenerate_sizes() {
        assert_eq!(all_orderings(0), vec![Vec::<usize>::new()]);
        assert_eq!(all_orderings(1), vec![vec![0]]);
        assert!(search_pairs(1).is_empty());
    }

    #[test]
    fn ranks_invert_orderings() {
        let ordering = [2, 0, 3, 1];
        let ranks = ordering_to_ranks(&ordering);
        assert_eq!(ranks, vec![1.0, 3.0, 0.0, 2.0]);
        assert_eq!(argsort(&ranks), ordering.to_vec());
    }

    #[test]
    fn weight_ordering_is_stable_on_ties() {
        assert_eq!(ordering_by_weight(&[0.2, 0.4, 0.2, 0.2]), vec![1, 0, 2, 3]);
        assert_eq!(argsort(&[2.0, 1.0, 1.0, 1.0, 3.0]), vec![1, 2, 3, 0, 4]);
    }
}
