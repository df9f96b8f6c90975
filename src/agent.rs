//! Voting agents and their personalities.

use crate::area::Area;
use crate::distance::DistanceMetric;
use crate::error::ModelError;
use crate::grid::Grid;
use crate::ranking::{OptionSpace, all_orderings, ordering_by_weight, ordering_to_ranks};
use anyhow::Result;
use rand::prelude::*;
use rand_distr::Bernoulli;
use serde::{Deserialize, Serialize};

/// Color that never takes part in a personality.
pub const NEUTRAL_COLOR: usize = 0;

/// An agent with limited knowledge and assets that may pay to vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoterAgent {
    id: usize,
    position: (usize, usize),
    personality: Vec<f64>,
    personality_ranks: Vec<f64>,
    assets: f64,
    known_cells: Vec<usize>,
    participation_count: u64,
}

impl VoterAgent {
    /// Create an agent standing on the cell at `position` (row, col).
    pub fn new(id: usize, position: (usize, usize), personality: Vec<f64>, assets: f64) -> Self {
        let personality_ranks = ordering_to_ranks(&ordering_by_weight(&personality));
        Self {
            id,
            position,
            personality,
            personality_ranks,
            assets: assets.max(0.0),
            known_cells: Vec::new(),
            participation_count: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn position(&self) -> (usize, usize) {
        self.position
    }

    pub fn personality(&self) -> &[f64] {
        &self.personality
    }

    pub fn assets(&self) -> f64 {
        self.assets
    }

    pub fn known_cells(&self) -> &[usize] {
        &self.known_cells
    }

    pub fn participation_count(&self) -> u64 {
        self.participation_count
    }

    /// Replace the agent's knowledge with up to `n_known` random cells of `area`.
    pub fn update_known_cells<R: Rng + ?Sized>(&mut self, area: &Area, n_known: usize, rng: &mut R) {
        self.known_cells.clear();
        self.known_cells
            .extend(area.cells().choose_multiple(rng, n_known).copied());
    }

    /// Color distribution of `area` as far as the agent knows it.
    ///
    /// Only known cells inside the area count. Colors never seen are zero,
    /// and the whole vector is zero if the agent knows no cell of the area.
    pub fn estimate_real_distribution(&self, area: &Area, grid: &Grid) -> Vec<f64> {
        let mut dist = vec![0.0; grid.n_colors()];
        let relevant = area.filter_cells(&self.known_cells);
        if relevant.is_empty() {
            return dist;
        }
        for &idx in &relevant {
            dist[grid.cell(idx).color] += 1.0;
        }
        let n_known = relevant.len() as f64;
        dist.iter_mut().for_each(|val| *val /= n_known);
        dist
    }

    /// Whether the agent takes part in the upcoming election.
    ///
    /// A coin flip with bias `participation_prob` for now.
    pub fn ask_for_participation<R: Rng + ?Sized>(
        &self,
        participation_prob: f64,
        rng: &mut R,
    ) -> Result<bool> {
        Ok(Bernoulli::new(participation_prob)?.sample(rng))
    }

    /// Weight the agent gives to its own personality over the estimated reality.
    pub fn decide_altruism_factor<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.random::<f64>()
    }

    /// Distribution the agent assumes to be the best outcome of the election.
    pub fn compute_assumed_opt_dist<R: Rng + ?Sized>(
        &self,
        area: &Area,
        grid: &Grid,
        rng: &mut R,
    ) -> Vec<f64> {
        let a_factor = self.decide_altruism_factor(rng);
        let est_dist = self.estimate_real_distribution(area, grid);
        combine_and_normalize(&self.personality, &est_dist, a_factor)
    }

    /// Cast a ballot: the disagreement of the agent with every option.
    pub fn vote<R: Rng + ?Sized>(
        &self,
        area: &Area,
        grid: &Grid,
        options: &OptionSpace,
        metric: DistanceMetric,
        rng: &mut R,
    ) -> Result<Vec<f64>, ModelError> {
        let opt_dist = self.compute_assumed_opt_dist(area, grid, rng);
        let opt_ranks = ordering_to_ranks(&ordering_by_weight(&opt_dist));
        options
            .ranks()
            .iter()
            .map(|ranks| metric.distance(ranks, &opt_ranks, options.pairs()))
            .collect()
    }

    /// Distance between the agent's personality and the real color ranking.
    pub fn personal_alignment(
        &self,
        real_ranks: &[f64],
        metric: DistanceMetric,
        pairs: &[(usize, usize)],
    ) -> Result<f64, ModelError> {
        metric.distance(&self.personality_ranks, real_ranks, pairs)
    }

    /// Pay the participation fee.
    pub fn pay_election_cost(&mut self, cost: f64) {
        self.assets = (self.assets - cost).max(0.0);
        self.participation_count += 1;
    }

    /// Add a (possibly negative) reward; assets never drop below zero.
    pub fn receive_reward(&mut self, reward: f64) {
        self.assets = (self.assets + reward).max(0.0);
    }
}

/// Linear combination `factor * dist_1 + (1 - factor) * dist_2`, normalized to sum 1.
///
/// Falls back to the uniform distribution when the combination is all zero.
pub fn combine_and_normalize(dist_1: &[f64], dist_2: &[f64], factor: f64) -> Vec<f64> {
    let mut res: Vec<f64> = dist_1
        .iter()
        .zip(dist_2)
        .map(|(a, b)| factor * a + (1.0 - factor) * b)
        .collect();
    let sum: f64 = res.iter().sum();
    if sum > 0.0 {
        res.iter_mut().for_each(|val| *val /= sum);
    } else {
        let n = res.len() as f64;
        res.fill(1.0 / n);
    }
    res
}

/// Number of distinct personalities over `n_colors` colors (neutral color
/// excluded) that rank `n_pers_colors` of them.
pub fn max_personalities(n_colors: usize, n_pers_colors: usize) -> usize {
    let pool = n_colors.saturating_sub(1);
    if n_pers_colors > pool {
        return 0;
    }
    (pool - n_pers_colors + 1..=pool).product()
}

/// Pool of `n_pers` distinct personalities.
///
/// Each personality ranks `n_pers_colors` non-neutral colors and gives them
/// linearly decreasing weights `k, k - 1, ..., 1` (normalized); all other
/// colors, the neutral one included, get zero.
pub fn create_personalities<R: Rng + ?Sized>(
    n_colors: usize,
    n_pers_colors: usize,
    n_pers: usize,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    let mut prefixes: Vec<Vec<usize>> = all_orderings(n_colors.saturating_sub(1))
        .into_iter()
        .map(|ordering| {
            ordering
                .into_iter()
                .take(n_pers_colors)
                .map(|color| color + 1)
                .collect()
        })
        .collect();
    prefixes.sort();
    prefixes.dedup();
    prefixes.shuffle(rng);

    let weight_sum = (n_pers_colors * (n_pers_colors + 1) / 2) as f64;
    prefixes
        .into_iter()
        .take(n_pers)
        .map(|prefix| {
            let mut personality = vec![0.0; n_colors];
            for (rank, &color) in prefix.iter().enumerate() {
                personality[color] = (n_pers_colors - rank) as f64 / weight_sum;
            }
            debug_assert_eq!(personality[NEUTRAL_COLOR], 0.0);
            personality
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn personalities_are_distinct_and_normalized() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        assert_eq!(max_personalities(5, 2), 12);
        assert_eq!(max_personalities(4, 3), 6);
        assert_eq!(max_personalities(3, 3), 0);

        let pool = create_personalities(5, 2, 12, &mut rng);
        assert_eq!(pool.len(), 12);
        for personality in &pool {
            assert_eq!(personality.len(), 5);
            assert_eq!(personality[NEUTRAL_COLOR], 0.0);
            assert!((personality.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            assert_eq!(personality.iter().filter(|&&w| w > 0.0).count(), 2);
        }
        let mut unique = pool.clone();
        unique.sort_by(|a, b| a.partial_cmp(b).unwrap());
        unique.dedup();
        assert_eq!(unique.len(), 12);

        assert_eq!(create_personalities(4, 3, 100, &mut rng).len(), 6);
    }

    #[test]
    fn combination_is_normalized() {
        let res = combine_and_normalize(&[0.0, 0.5, 0.5], &[1.0, 0.0, 0.0], 0.5);
        assert_eq!(res, vec![0.5, 0.25, 0.25]);
        let res = combine_and_normalize(&[0.0, 0.0], &[0.0, 0.0], 0.3);
        assert_eq!(res, vec![0.5, 0.5]);
    }

    #[test]
    fn assets_never_become_negative() {
        let mut agent = VoterAgent::new(0, (0, 0), vec![0.0, 1.0], 3.0);
        agent.pay_election_cost(2.0);
        assert_eq!(agent.assets(), 1.0);
        assert_eq!(agent.participation_count(), 1);
        agent.receive_reward(-10.0);
        assert_eq!(agent.assets(), 0.0);
        agent.receive_reward(2.5);
        assert_eq!(agent.assets(), 2.5);
    }

    #[test]
    fn personality_ranks_follow_weights() {
        let agent = VoterAgent::new(0, (0, 0), vec![0.0, 1.0 / 6.0, 0.5, 1.0 / 3.0], 1.0);
        let pairs = crate::ranking::search_pairs(4);
        let real = ordering_to_ranks(&[2, 3, 1, 0]);
        let align = agent
            .personal_alignment(&real, DistanceMetric::KendallTau, &pairs)
            .unwrap();
        assert_eq!(align, 0.0);
        let reversed = ordering_to_ranks(&[0, 1, 3, 2]);
        let align = agent
            .personal_alignment(&reversed, DistanceMetric::KendallTau, &pairs)
            .unwrap();
        assert_eq!(align, 1.0);
    }

    #[test]
    fn ballot_disagrees_least_with_own_ordering() {
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let mut grid = Grid::generate(4, 4, 4, 0.0, &mut rng).unwrap();
        let mut area = Area::new(0, 2, 2, 0.0, 4, &mut rng).unwrap();
        area.bind((0, 0), &mut grid, &[]).unwrap();
        let options = OptionSpace::new(4);

        // Without known cells the blend is the personality itself.
        let agent = VoterAgent::new(0, (0, 0), vec![0.0, 1.0 / 6.0, 0.5, 1.0 / 3.0], 1.0);
        assert!(agent.known_cells().is_empty());
        let own = (0..options.len())
            .find(|&opt| options.ordering(opt) == [2, 3, 1, 0])
            .unwrap();

        for metric in [DistanceMetric::KendallTau, DistanceMetric::Spearman] {
            let ballot = agent.vote(&area, &grid, &options, metric, &mut rng).unwrap();
            assert_eq!(ballot.len(), 24);
            assert!(ballot.iter().all(|val| (0.0..=1.0).contains(val)));
            assert_eq!(ballot[own], 0.0);
            assert!(
                ballot
                    .iter()
                    .enumerate()
                    .all(|(opt, &val)| opt == own || val > 0.0)
            );
            let reversed = (0..options.len())
                .find(|&opt| options.ordering(opt) == [0, 1, 3, 2])
                .unwrap();
            assert_eq!(ballot[reversed], 1.0);
        }
    }
}
