//! The simulated world and its election scheduler.

use crate::agent::{VoterAgent, create_personalities};
use crate::area::{Area, ElectionOutcome, ElectionRules};
use crate::config::Config;
use crate::grid::Grid;
use crate::model::{AgentState, State};
use crate::ranking::OptionSpace;
use anyhow::{Context, Result};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Grid, areas and agents, advanced one tick at a time.
///
/// Every area holds one election per tick. Areas are visited in a fresh
/// random order each tick, so a cell shared by several areas keeps the
/// color written by the last of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    grid: Grid,
    areas: Vec<Area>,
    agents: Vec<VoterAgent>,
    personalities: Vec<Vec<f64>>,
    options: OptionSpace,
    rules: ElectionRules,
    tick: u64,
}

impl World {
    /// Create an empty world over an existing grid.
    pub fn new(grid: Grid, personalities: Vec<Vec<f64>>, rules: ElectionRules) -> Self {
        let options = OptionSpace::new(grid.n_colors());
        Self {
            grid,
            areas: Vec::new(),
            agents: Vec::new(),
            personalities,
            options,
            rules,
            tick: 0,
        }
    }

    /// Generate a random world as described by `cfg`.
    pub fn generate<R: Rng + ?Sized>(cfg: &Config, rng: &mut R) -> Result<Self> {
        let mut grid = Grid::generate(
            cfg.model.height,
            cfg.model.width,
            cfg.model.num_colors,
            cfg.init.heterogeneity,
            rng,
        )
        .context("failed to generate grid")?;
        grid.color_patches(cfg.init.color_patches_steps, cfg.init.patch_power, rng)
            .context("failed to create color patches")?;

        let personalities = create_personalities(
            cfg.model.num_colors,
            cfg.init.num_personality_colors,
            cfg.init.num_personalities,
            rng,
        );
        let mut world = Self::new(grid, personalities, cfg.election_rules());

        world
            .populate(cfg.init.num_agents, cfg.init.assets, rng)
            .context("failed to populate world")?;

        for anchor in area_anchors(cfg.model.height, cfg.model.width, cfg.model.num_areas, rng) {
            world
                .add_area(
                    anchor,
                    cfg.model.av_area_height,
                    cfg.model.av_area_width,
                    cfg.model.area_size_variance,
                    rng,
                )
                .with_context(|| format!("failed to add area at {anchor:?}"))?;
        }

        log::info!(
            "generated world: {} areas, {} agents, {} options",
            world.areas.len(),
            world.agents.len(),
            world.options.len()
        );
        Ok(world)
    }

    /// Place `n_agents` agents with random personalities on random cells.
    pub fn populate<R: Rng + ?Sized>(
        &mut self,
        n_agents: usize,
        assets: f64,
        rng: &mut R,
    ) -> Result<()> {
        for _ in 0..n_agents {
            let personality = self
                .personalities
                .choose(rng)
                .context("personality pool is empty")?
                .clone();
            let position = (
                rng.random_range(0..self.grid.height()),
                rng.random_range(0..self.grid.width()),
            );
            self.add_agent(position, personality, assets);
        }
        Ok(())
    }

    /// Add an agent and return its id.
    ///
    /// Agents only join areas bound after them.
    pub fn add_agent(
        &mut self,
        position: (usize, usize),
        personality: Vec<f64>,
        assets: f64,
    ) -> usize {
        let id = self.agents.len();
        self.agents
            .push(VoterAgent::new(id, position, personality, assets));
        id
    }

    /// Add an area anchored at `(row, col)` and return its id.
    pub fn add_area<R: Rng + ?Sized>(
        &mut self,
        anchor: (usize, usize),
        height: usize,
        width: usize,
        size_variance: f64,
        rng: &mut R,
    ) -> Result<usize> {
        let id = self.areas.len();
        let mut area = Area::new(id, height, width, size_variance, self.grid.n_colors(), rng)?;
        area.bind(anchor, &mut self.grid, &self.agents)?;
        log::debug!(
            "area {id}: {}x{} at {:?}, {} agents",
            area.height(),
            area.width(),
            area.idx_field(),
            area.agents().len()
        );
        self.areas.push(area);
        Ok(id)
    }

    /// Hold one election in every area, in random order.
    ///
    /// Returns the outcomes in the order the elections took place.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<(usize, ElectionOutcome)>> {
        let mut order: Vec<usize> = (0..self.areas.len()).collect();
        order.shuffle(rng);

        let mut outcomes = Vec::with_capacity(order.len());
        for i_area in order {
            let outcome = self.areas[i_area]
                .conduct_election(
                    &mut self.grid,
                    &mut self.agents,
                    &self.options,
                    &self.rules,
                    rng,
                )
                .with_context(|| format!("failed to conduct election in area {i_area}"))?;
            if let ElectionOutcome::Held {
                winner,
                participants,
                ..
            } = &outcome
            {
                log::debug!(
                    "area {i_area}: option {winner} won with {participants} voters, turnout {}%",
                    self.areas[i_area].voter_turnout()
                );
            }
            outcomes.push((i_area, outcome));
        }

        // Later elections may have recolored cells of earlier areas.
        for area in &mut self.areas {
            area.update_color_distribution(&self.grid);
        }

        self.tick += 1;
        Ok(outcomes)
    }

    pub fn state(&self) -> State {
        State {
            tick: self.tick,
            areas: self.areas.iter().map(Area::state).collect(),
            agents: self
                .agents
                .iter()
                .map(|agent| AgentState {
                    id: agent.id(),
                    assets: agent.assets(),
                    personality: agent.personality().to_vec(),
                    participation_count: agent.participation_count(),
                })
                .collect(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn agents(&self) -> &[VoterAgent] {
        &self.agents
    }

    pub fn options(&self) -> &OptionSpace {
        &self.options
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}

/// Anchors spreading `n_areas` areas evenly over the grid.
///
/// A lattice of about `sqrt(n_areas)` anchors per side is used first; areas
/// that do not fit on it get random anchors.
pub fn area_anchors<R: Rng + ?Sized>(
    height: usize,
    width: usize,
    n_areas: usize,
    rng: &mut R,
) -> Vec<(usize, usize)> {
    let per_side = ((n_areas as f64).sqrt().round() as usize).max(1);
    let row_dist = (height / per_side).max(1);
    let col_dist = (width / per_side).max(1);

    let mut anchors: Vec<(usize, usize)> = (0..height)
        .step_by(row_dist)
        .flat_map(|row| (0..width).step_by(col_dist).map(move |col| (row, col)))
        .take(n_areas)
        .collect();
    while anchors.len() < n_areas {
        anchors.push((rng.random_range(0..height), rng.random_range(0..width)));
    }
    anchors
}
