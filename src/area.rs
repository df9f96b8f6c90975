//! Areas and their elections.
//!
//! An area is a rectangular (toroidally wrapped) block of cells together with
//! the agents standing on it. Areas may overlap, so a cell can belong to
//! several areas; each cell keeps the ids of the areas containing it.

use crate::agent::VoterAgent;
use crate::aggregator::Aggregator;
use crate::distance::DistanceMetric;
use crate::error::ModelError;
use crate::grid::Grid;
use crate::model::AreaState;
use crate::ranking::{OptionSpace, ordering_by_weight, ordering_to_ranks};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

/// Rules shared by the elections of every area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionRules {
    pub voting_rule: Aggregator,
    pub distance: DistanceMetric,
    pub election_cost: f64,
    pub max_reward: f64,
    /// Fraction of an area's cells mutated after each election.
    pub mu: f64,
    /// Exponent sharpening the mutation toward the top of the voted ordering.
    pub election_impact: f64,
    pub participation_prob: f64,
    /// Number of cells an agent gets to know before voting.
    pub known_cells: usize,
}

/// Stage of an area's election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Collect,
    Aggregate,
    Score,
    Reward,
    Mutate,
}

/// Result of a single election.
#[derive(Debug, Clone, PartialEq)]
pub enum ElectionOutcome {
    /// Nobody participated; turnout is zero and nothing else happened.
    Skipped,
    Held {
        winner: usize,
        participants: usize,
        /// Every `(cell, color)` write performed by the mutation.
        mutations: Vec<(usize, usize)>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    id: usize,
    height: usize,
    width: usize,
    height_off: usize,
    width_off: usize,
    idx_field: Option<(usize, usize)>,
    cells: Vec<usize>,
    border_cells: Vec<usize>,
    agents: Vec<usize>,
    color_distribution: Vec<f64>,
    voted_ordering: Vec<usize>,
    voter_turnout: u32,
    distance_to_reality: f64,
    phase: Phase,
}

impl Area {
    /// Create an unbound area of (about) `height x width` cells.
    ///
    /// With a non-zero `size_variance` both sides are scaled by independent
    /// factors drawn from `[1 - size_variance, 1 + size_variance]`.
    pub fn new<R: Rng + ?Sized>(
        id: usize,
        height: usize,
        width: usize,
        size_variance: f64,
        n_colors: usize,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        if !(0.0..=1.0).contains(&size_variance) {
            return Err(ModelError::InvalidSizeVariance(size_variance));
        }
        let (act_height, act_width) = if size_variance == 0.0 {
            (height, width)
        } else {
            let range = 1.0 - size_variance..=1.0 + size_variance;
            let h_factor = rng.random_range(range.clone());
            let w_factor = rng.random_range(range);
            (
                (height as f64 * h_factor) as usize,
                (width as f64 * w_factor) as usize,
            )
        };

        Ok(Self {
            id,
            height: act_height.max(1),
            width: act_width.max(1),
            height_off: height.abs_diff(act_height),
            width_off: width.abs_diff(act_width),
            idx_field: None,
            cells: Vec::new(),
            border_cells: Vec::new(),
            agents: Vec::new(),
            color_distribution: vec![0.0; n_colors],
            voted_ordering: (0..n_colors).collect(),
            voter_turnout: 0,
            distance_to_reality: 0.0,
            phase: Phase::Idle,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Top-left cell of the area, once bound.
    pub fn idx_field(&self) -> Option<(usize, usize)> {
        self.idx_field
    }

    /// Member cells, sorted by index.
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Member cells on the edge of the footprint, sorted by index.
    pub fn border_cells(&self) -> &[usize] {
        &self.border_cells
    }

    pub fn agents(&self) -> &[usize] {
        &self.agents
    }

    pub fn color_distribution(&self) -> &[f64] {
        &self.color_distribution
    }

    pub fn voted_ordering(&self) -> &[usize] {
        &self.voted_ordering
    }

    pub fn voter_turnout(&self) -> u32 {
        self.voter_turnout
    }

    pub fn distance_to_reality(&self) -> f64 {
        self.distance_to_reality
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Bind the area to the footprint whose top-left corner is `(row, col)`.
    ///
    /// The anchor is shifted by half the size jitter and the footprint wraps
    /// around the grid. Cells and agents inside become members; previous
    /// memberships and border marks are dropped.
    pub fn bind(
        &mut self,
        (row, col): (usize, usize),
        grid: &mut Grid,
        agents: &[VoterAgent],
    ) -> Result<(), ModelError> {
        let (grid_height, grid_width) = (grid.height(), grid.width());
        if row >= grid_height || col >= grid_width {
            return Err(ModelError::AnchorOutOfBounds {
                row,
                col,
                height: grid_height,
                width: grid_width,
            });
        }
        // A footprint larger than the grid would hold cells twice.
        self.height = self.height.min(grid_height);
        self.width = self.width.min(grid_width);

        let adj_row = (row + self.height_off / 2) % grid_height;
        let adj_col = (col + self.width_off / 2) % grid_width;

        let mut cells = Vec::with_capacity(self.height * self.width);
        let mut border_cells = Vec::new();
        for d_row in 0..self.height {
            for d_col in 0..self.width {
                let idx = grid.idx(adj_row + d_row, adj_col + d_col);
                if d_row == 0 || d_col == 0 || d_row == self.height - 1 || d_col == self.width - 1 {
                    border_cells.push(idx);
                }
                cells.push(idx);
            }
        }
        self.assign_cells(cells, grid);

        border_cells.sort_unstable();
        for &idx in &border_cells {
            grid.cell_mut(idx).border_count += 1;
        }
        self.border_cells = border_cells;

        self.agents = agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| {
                let (a_row, a_col) = agent.position();
                (a_row + grid_height - adj_row) % grid_height < self.height
                    && (a_col + grid_width - adj_col) % grid_width < self.width
            })
            .map(|(i_agt, _)| i_agt)
            .collect();

        self.idx_field = Some((adj_row, adj_col));
        Ok(())
    }

    /// Replace the member cells, keeping the cells' back-references consistent.
    ///
    /// The old footprint's border marks are released.
    pub fn assign_cells(&mut self, mut cells: Vec<usize>, grid: &mut Grid) {
        for &idx in &self.cells {
            grid.cell_mut(idx).areas.retain(|&id| id != self.id);
        }
        for idx in self.border_cells.drain(..) {
            let cell = grid.cell_mut(idx);
            cell.border_count = cell.border_count.saturating_sub(1);
        }
        cells.sort_unstable();
        cells.dedup();
        for &idx in &cells {
            grid.cell_mut(idx).areas.push(self.id);
        }
        self.cells = cells;
        self.update_color_distribution(grid);
    }

    pub fn contains_cell(&self, idx: usize) -> bool {
        self.cells.binary_search(&idx).is_ok()
    }

    /// The cells of `cells` that lie within the area, in their given order.
    pub fn filter_cells(&self, cells: &[usize]) -> Vec<usize> {
        cells
            .iter()
            .copied()
            .filter(|&idx| self.contains_cell(idx))
            .collect()
    }

    /// Recount the colors of the member cells.
    ///
    /// An area without cells has an all-zero distribution.
    pub fn update_color_distribution(&mut self, grid: &Grid) {
        self.color_distribution.fill(0.0);
        if self.cells.is_empty() {
            return;
        }
        for &idx in &self.cells {
            self.color_distribution[grid.cell(idx).color] += 1.0;
        }
        let n_cells = self.cells.len() as f64;
        self.color_distribution
            .iter_mut()
            .for_each(|val| *val /= n_cells);
    }

    /// Colors ordered by descending frequency in the area.
    pub fn real_ordering(&self) -> Vec<usize> {
        ordering_by_weight(&self.color_distribution)
    }

    /// Run one full election: collect ballots, aggregate, score, reward, mutate.
    pub fn conduct_election<R: Rng + ?Sized>(
        &mut self,
        grid: &mut Grid,
        agents: &mut [VoterAgent],
        options: &OptionSpace,
        rules: &ElectionRules,
        rng: &mut R,
    ) -> Result<ElectionOutcome> {
        self.enter(Phase::Collect);
        let pref_table = self
            .collect_ballots(grid, agents, options, rules, rng)
            .context("failed to collect ballots")?;
        let participants = pref_table.len();
        self.voter_turnout = match self.agents.len() {
            0 => 0,
            n_agents => (100 * participants / n_agents) as u32,
        };
        if participants == 0 {
            log::debug!("area {} skipped its election: no participants", self.id);
            self.enter(Phase::Idle);
            return Ok(ElectionOutcome::Skipped);
        }

        self.enter(Phase::Aggregate);
        let ranking = rules
            .voting_rule
            .aggregate(&pref_table, options.len(), rng);
        let winner = *ranking.first().context("aggregation returned no option")?;
        self.voted_ordering = options.ordering(winner).to_vec();

        self.enter(Phase::Score);
        self.update_color_distribution(grid);
        let real_ranks = ordering_to_ranks(&self.real_ordering());
        let voted_ranks = ordering_to_ranks(&self.voted_ordering);
        self.distance_to_reality =
            rules
                .distance
                .distance(&real_ranks, &voted_ranks, options.pairs())?;

        self.enter(Phase::Reward);
        self.distribute_rewards(agents, &real_ranks, options, rules)
            .context("failed to distribute rewards")?;

        self.enter(Phase::Mutate);
        let mutations = self
            .mutate(grid, rules, rng)
            .context("failed to mutate cells")?;

        self.enter(Phase::Idle);
        Ok(ElectionOutcome::Held {
            winner,
            participants,
            mutations,
        })
    }

    fn enter(&mut self, phase: Phase) {
        log::trace!("area {}: {:?} -> {:?}", self.id, self.phase, phase);
        self.phase = phase;
    }

    fn collect_ballots<R: Rng + ?Sized>(
        &self,
        grid: &Grid,
        agents: &mut [VoterAgent],
        options: &OptionSpace,
        rules: &ElectionRules,
        rng: &mut R,
    ) -> Result<Vec<Vec<f64>>> {
        let mut pref_table = Vec::new();
        for &i_agt in &self.agents {
            let agent = &mut agents[i_agt];
            agent.update_known_cells(self, rules.known_cells, rng);
            if agent.assets() < rules.election_cost
                || !agent.ask_for_participation(rules.participation_prob, rng)?
            {
                continue;
            }
            agent.pay_election_cost(rules.election_cost);
            let ballot = agent.vote(self, grid, options, rules.distance, rng)?;
            pref_table.push(ballot);
        }
        Ok(pref_table)
    }

    fn distribute_rewards(
        &self,
        agents: &mut [VoterAgent],
        real_ranks: &[f64],
        options: &OptionSpace,
        rules: &ElectionRules,
    ) -> Result<()> {
        let common = (0.5 - self.distance_to_reality) * rules.max_reward;
        for &i_agt in &self.agents {
            let agent = &mut agents[i_agt];
            let alignment = agent.personal_alignment(real_ranks, rules.distance, options.pairs())?;
            let personal = (0.5 - alignment) * rules.max_reward;
            agent.receive_reward(common + personal);
        }
        Ok(())
    }

    /// Recolor `round(mu * |cells|)` random member cells after the voted ordering.
    ///
    /// The color at rank `r` of `m` is drawn with weight `(m - r)^election_impact`.
    fn mutate<R: Rng + ?Sized>(
        &mut self,
        grid: &mut Grid,
        rules: &ElectionRules,
        rng: &mut R,
    ) -> Result<Vec<(usize, usize)>> {
        let n_cells = self.cells.len();
        let n_mut = ((rules.mu * n_cells as f64).round() as usize).min(n_cells);

        let n_colors = self.voted_ordering.len();
        let weights = (0..n_colors).map(|rank| ((n_colors - rank) as f64).powf(rules.election_impact));
        let rank_dist = WeightedIndex::new(weights)?;

        let mut mutations = Vec::with_capacity(n_mut);
        for &idx in self.cells.choose_multiple(rng, n_mut) {
            let color = self.voted_ordering[rank_dist.sample(rng)];
            grid.cell_mut(idx).color = color;
            mutations.push((idx, color));
        }

        self.update_color_distribution(grid);
        Ok(mutations)
    }

    /// Snapshot of the area's election state.
    pub fn state(&self) -> AreaState {
        AreaState {
            id: self.id,
            color_distribution: self.color_distribution.clone(),
            voted_ordering: self.voted_ordering.clone(),
            voter_turnout: self.voter_turnout,
            distance_to_reality: self.distance_to_reality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha12Rng;

    fn rules(mu: f64) -> ElectionRules {
        ElectionRules {
            voting_rule: Aggregator::MajorityRule,
            distance: DistanceMetric::KendallTau,
            election_cost: 1.0,
            max_reward: 10.0,
            mu,
            election_impact: 1.0,
            participation_prob: 1.0,
            known_cells: 4,
        }
    }

    fn setup(rng: &mut ChaCha12Rng) -> (Grid, Vec<VoterAgent>, Area) {
        let mut grid = Grid::generate(6, 6, 3, 0.3, rng).unwrap();
        let agents = vec![
            VoterAgent::new(0, (1, 1), vec![0.0, 2.0 / 3.0, 1.0 / 3.0], 5.0),
            VoterAgent::new(1, (2, 2), vec![0.0, 1.0 / 3.0, 2.0 / 3.0], 5.0),
            VoterAgent::new(2, (5, 5), vec![0.0, 1.0, 0.0], 5.0),
        ];
        let mut area = Area::new(0, 3, 3, 0.0, 3, rng).unwrap();
        area.bind((1, 1), &mut grid, &agents).unwrap();
        (grid, agents, area)
    }

    #[test]
    fn binding_registers_cells_and_agents() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let (grid, _, area) = setup(&mut rng);
        assert_eq!(area.idx_field(), Some((1, 1)));
        assert_eq!(area.cells().len(), 9);
        assert_eq!(area.agents(), &[0, 1]);
        for (idx, cell) in grid.cells().iter().enumerate() {
            assert_eq!(cell.areas.contains(&0), area.contains_cell(idx));
        }
        assert!(grid.cell(grid.idx(1, 1)).is_border());
        assert!(!grid.cell(grid.idx(2, 2)).is_border());
        assert_eq!(area.border_cells().len(), 8);
    }

    #[test]
    fn footprint_wraps_around_the_grid() {
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let mut grid = Grid::generate(4, 4, 2, 0.0, &mut rng).unwrap();
        let agents = vec![VoterAgent::new(0, (0, 0), vec![0.0, 1.0], 1.0)];
        let mut area = Area::new(7, 2, 2, 0.0, 2, &mut rng).unwrap();
        area.bind((3, 3), &mut grid, &agents).unwrap();
        let mut expected = vec![grid.idx(3, 3), grid.idx(3, 0), grid.idx(0, 3), 0];
        expected.sort();
        assert_eq!(area.cells(), expected.as_slice());
        assert_eq!(area.agents(), &[0]);
    }

    #[test]
    fn invalid_setup_is_rejected() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        assert_eq!(
            Area::new(0, 2, 2, 1.5, 2, &mut rng),
            Err(ModelError::InvalidSizeVariance(1.5))
        );
        let mut grid = Grid::generate(4, 4, 2, 0.0, &mut rng).unwrap();
        let mut area = Area::new(0, 2, 2, 0.0, 2, &mut rng).unwrap();
        assert!(matches!(
            area.bind((4, 0), &mut grid, &[]),
            Err(ModelError::AnchorOutOfBounds { .. })
        ));
    }

    #[test]
    fn size_variance_keeps_areas_inside_the_grid() {
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        let mut grid = Grid::generate(8, 8, 2, 0.0, &mut rng).unwrap();
        for id in 0..50 {
            let mut area = Area::new(id, 6, 6, 1.0, 2, &mut rng).unwrap();
            area.bind((0, 0), &mut grid, &[]).unwrap();
            assert!((1..=8).contains(&area.height()));
            assert!((1..=8).contains(&area.width()));
            assert_eq!(area.cells().len(), area.height() * area.width());
        }
    }

    #[test]
    fn color_distribution_sums_to_one_after_reassignment() {
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        let (mut grid, _, mut area) = setup(&mut rng);
        let all: Vec<usize> = (0..grid.cells().len()).collect();
        for n_cells in [1, 5, 9, 20, 36] {
            let cells: Vec<usize> = all.choose_multiple(&mut rng, n_cells).copied().collect();
            area.assign_cells(cells, &mut grid);
            let sum: f64 = area.color_distribution().iter().sum();
            assert!((sum - 1.0).abs() < 1e-7);
        }
        // Cells no longer in the area dropped their back-reference.
        for (idx, cell) in grid.cells().iter().enumerate() {
            assert_eq!(cell.areas.contains(&0), area.contains_cell(idx));
        }
    }

    #[test]
    fn filter_cells_keeps_members_only() {
        let mut rng = ChaCha12Rng::seed_from_u64(6);
        let (grid, _, area) = setup(&mut rng);
        let inside = grid.idx(2, 3);
        let outside = grid.idx(5, 0);
        assert_eq!(area.filter_cells(&[outside, inside, outside]), vec![inside]);
    }

    #[test]
    fn estimate_counts_known_area_cells() {
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let (grid, mut agents, area) = setup(&mut rng);
        let agent = &mut agents[0];
        assert_eq!(agent.estimate_real_distribution(&area, &grid), vec![0.0; 3]);

        agent.update_known_cells(&area, 4, &mut rng);
        assert_eq!(agent.known_cells().len(), 4);
        assert!(agent.known_cells().iter().all(|&idx| area.contains_cell(idx)));

        let est = agent.estimate_real_distribution(&area, &grid);
        let mut counts = vec![0.0; 3];
        for &idx in agent.known_cells() {
            counts[grid.cell(idx).color] += 0.25;
        }
        assert_eq!(est, counts);
    }

    #[test]
    fn election_rewards_and_mutates() {
        let mut rng = ChaCha12Rng::seed_from_u64(8);
        let (mut grid, mut agents, mut area) = setup(&mut rng);
        let options = OptionSpace::new(3);

        let outcome = area
            .conduct_election(&mut grid, &mut agents, &options, &rules(1.0), &mut rng)
            .unwrap();
        let ElectionOutcome::Held {
            winner,
            participants,
            mutations,
        } = outcome
        else {
            panic!("election was skipped");
        };
        assert_eq!(participants, 2);
        assert_eq!(area.voter_turnout(), 100);
        assert_eq!(area.voted_ordering(), options.ordering(winner));
        assert!((0.0..=1.0).contains(&area.distance_to_reality()));
        assert_eq!(area.phase(), Phase::Idle);

        assert_eq!(mutations.len(), 9);
        for &(idx, color) in &mutations {
            assert!(area.contains_cell(idx));
            assert_eq!(grid.cell(idx).color, color);
        }
        assert!((area.color_distribution().iter().sum::<f64>() - 1.0).abs() < 1e-7);

        assert_eq!(agents[0].participation_count(), 1);
        assert_eq!(agents[2].participation_count(), 0);
        assert_eq!(agents[2].assets(), 5.0);
        assert!(agents.iter().all(|agent| agent.assets() >= 0.0));
    }

    #[test]
    fn election_without_participants_is_skipped() {
        let mut rng = ChaCha12Rng::seed_from_u64(9);
        let (mut grid, mut agents, mut area) = setup(&mut rng);
        let options = OptionSpace::new(3);
        let colors: Vec<usize> = grid.cells().iter().map(|cell| cell.color).collect();

        let mut broke = rules(1.0);
        broke.election_cost = 100.0;
        let outcome = area
            .conduct_election(&mut grid, &mut agents, &options, &broke, &mut rng)
            .unwrap();
        assert_eq!(outcome, ElectionOutcome::Skipped);
        assert_eq!(area.voter_turnout(), 0);
        assert_eq!(area.voted_ordering(), &[0, 1, 2]);
        assert!(agents.iter().all(|agent| agent.assets() == 5.0));
        let after: Vec<usize> = grid.cells().iter().map(|cell| cell.color).collect();
        assert_eq!(after, colors);
    }

    #[test]
    fn heavy_losses_clamp_assets_at_zero() {
        let mut rng = ChaCha12Rng::seed_from_u64(10);
        let (mut grid, mut agents, mut area) = setup(&mut rng);
        let options = OptionSpace::new(3);
        let mut harsh = rules(0.0);
        harsh.max_reward = 1_000.0;
        for _ in 0..10 {
            area.conduct_election(&mut grid, &mut agents, &options, &harsh, &mut rng)
                .unwrap();
            assert!(agents.iter().all(|agent| agent.assets() >= 0.0));
        }
    }

    #[test]
    fn rewards_combine_common_and_personal_terms() {
        let mut rng = ChaCha12Rng::seed_from_u64(11);
        let mut grid = Grid::generate(3, 3, 3, 0.0, &mut rng).unwrap();
        // One cell of color 0, five of color 1, three of color 2: real ordering [1, 2, 0].
        for idx in 0..9 {
            grid.cell_mut(idx).color = match idx {
                0 => 0,
                1..=5 => 1,
                _ => 2,
            };
        }
        let mut agents = vec![
            // Ranks colors like reality and can afford to vote.
            VoterAgent::new(0, (0, 0), vec![0.0, 2.0 / 3.0, 1.0 / 3.0], 5.0),
            // One inversion away from reality and too poor to vote.
            VoterAgent::new(1, (1, 1), vec![0.0, 1.0 / 3.0, 2.0 / 3.0], 0.5),
        ];
        let mut area = Area::new(0, 3, 3, 0.0, 3, &mut rng).unwrap();
        area.bind((0, 0), &mut grid, &agents).unwrap();
        assert_eq!(area.real_ordering(), vec![1, 2, 0]);

        let options = OptionSpace::new(3);
        let mut blind = rules(0.0);
        blind.known_cells = 0;
        let outcome = area
            .conduct_election(&mut grid, &mut agents, &options, &blind, &mut rng)
            .unwrap();
        assert!(matches!(
            outcome,
            ElectionOutcome::Held {
                participants: 1,
                ..
            }
        ));
        assert_eq!(area.voter_turnout(), 50);

        // A lone voter knowing no cells votes its personality, which matches reality.
        assert_eq!(area.voted_ordering(), &[1, 2, 0]);
        assert_eq!(area.distance_to_reality(), 0.0);

        // 5 - 1 (cost) + 0.5 * 10 (common) + 0.5 * 10 (personal)
        assert!((agents[0].assets() - 14.0).abs() < 1e-9);
        // 0.5 + 0.5 * 10 (common) + (0.5 - 1/3) * 10 (personal)
        assert!((agents[1].assets() - (0.5 + 5.0 + 10.0 / 6.0)).abs() < 1e-9);
        assert_eq!(agents[1].participation_count(), 0);
    }

    fn mutated_color_counts(election_impact: f64, seed: u64) -> [usize; 3] {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let mut grid = Grid::generate(10, 10, 3, 0.0, &mut rng).unwrap();
        let mut area = Area::new(0, 10, 10, 0.0, 3, &mut rng).unwrap();
        area.bind((0, 0), &mut grid, &[]).unwrap();
        assert_eq!(area.voted_ordering(), &[0, 1, 2]);

        let mut mutation_rules = rules(1.0);
        mutation_rules.election_impact = election_impact;
        let mut counts = [0; 3];
        for _ in 0..10 {
            let mutations = area.mutate(&mut grid, &mutation_rules, &mut rng).unwrap();
            assert_eq!(mutations.len(), 100);
            for (_, color) in mutations {
                counts[color] += 1;
            }
        }
        counts
    }

    #[test]
    fn mutation_favors_top_of_voted_ordering() {
        // Weights 3^5, 2^5, 1^5: the top color gets 243 / 276 = 0.88 of the draws.
        let counts = mutated_color_counts(5.0, 12);
        assert!((820..=940).contains(&counts[0]), "{counts:?}");
        assert!(counts[1] > counts[2], "{counts:?}");
    }

    #[test]
    fn mutation_without_impact_is_uniform() {
        let counts = mutated_color_counts(0.0, 13);
        for count in counts {
            assert!((273..=393).contains(&count), "{counts:?}");
        }
    }

    #[test]
    fn rebinding_releases_old_border_marks() {
        let mut rng = ChaCha12Rng::seed_from_u64(14);
        let mut grid = Grid::generate(8, 8, 2, 0.0, &mut rng).unwrap();
        let mut area = Area::new(0, 3, 3, 0.0, 2, &mut rng).unwrap();
        let mut other = Area::new(1, 3, 3, 0.0, 2, &mut rng).unwrap();
        area.bind((0, 0), &mut grid, &[]).unwrap();
        other.bind((2, 2), &mut grid, &[]).unwrap();
        let corner = grid.idx(2, 2);
        assert_eq!(grid.cell(corner).border_count, 2);

        area.bind((4, 4), &mut grid, &[]).unwrap();
        assert!(!grid.cell(grid.idx(0, 0)).is_border());
        assert!(!grid.cell(grid.idx(0, 1)).is_border());
        // Still on the border of the other area.
        assert_eq!(grid.cell(corner).border_count, 1);
        assert!(grid.cell(grid.idx(4, 4)).is_border());
        assert!(!grid.cell(grid.idx(5, 5)).is_border());

        // Two rings of 8 cells sharing the corner (4, 4).
        let n_border = grid.cells().iter().filter(|cell| cell.is_border()).count();
        assert_eq!(n_border, 15);
    }
}
