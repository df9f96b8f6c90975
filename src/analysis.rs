use crate::config::Config;
use crate::model::State;
use crate::stats::{Accumulator, gini};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufWriter, path::Path};

pub trait Obs {
    fn update(&mut self, state: &State);
    fn report(&self) -> serde_json::Value;
}

/// Mean voter turnout over all areas, in percent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoterTurnout {
    acc: Accumulator,
}

impl Obs for VoterTurnout {
    fn update(&mut self, state: &State) {
        if state.areas.is_empty() {
            return;
        }
        let sum: f64 = state
            .areas
            .iter()
            .map(|area| area.voter_turnout as f64)
            .sum();
        self.acc.add(sum / state.areas.len() as f64);
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "voter_turnout": self.acc.report() })
    }
}

/// Mean distance between the voted and the real ordering of the areas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceToReality {
    acc: Accumulator,
}

impl Obs for DistanceToReality {
    fn update(&mut self, state: &State) {
        if state.areas.is_empty() {
            return;
        }
        let sum: f64 = state
            .areas
            .iter()
            .map(|area| area.distance_to_reality)
            .sum();
        self.acc.add(sum / state.areas.len() as f64);
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "distance_to_reality": self.acc.report() })
    }
}

/// Total assets and their Gini index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assets {
    collective: Accumulator,
    gini: Accumulator,
}

impl Obs for Assets {
    fn update(&mut self, state: &State) {
        let assets: Vec<f64> = state.agents.iter().map(|agent| agent.assets).collect();
        self.collective.add(assets.iter().sum());
        self.gini.add(gini(&assets));
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({
            "collective_assets": self.collective.report(),
            "gini_index": self.gini.report(),
        })
    }
}

/// Color distribution averaged over the areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvgColorDistribution {
    acc_vec: Vec<Accumulator>,
}

impl AvgColorDistribution {
    pub fn new(cfg: &Config) -> Self {
        let mut acc_vec = Vec::new();
        acc_vec.resize_with(cfg.model.num_colors, Accumulator::new);
        Self { acc_vec }
    }
}

impl Obs for AvgColorDistribution {
    fn update(&mut self, state: &State) {
        if state.areas.is_empty() {
            return;
        }
        let n_colors = self.acc_vec.len();
        let mut dist_sum = vec![0.0; n_colors];
        for area in &state.areas {
            for (color, &val) in area.color_distribution.iter().enumerate() {
                dist_sum[color] += val;
            }
        }
        for (acc, sum) in self.acc_vec.iter_mut().zip(dist_sum) {
            acc.add(sum / state.areas.len() as f64);
        }
    }

    fn report(&self) -> serde_json::Value {
        let reports: Vec<_> = self.acc_vec.iter().map(|acc| acc.report()).collect();
        serde_json::json!({ "avg_color_distribution": reports })
    }
}

/// Every observable of a run, updated once per tick.
///
/// Serializable so that it travels with the engine checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analyzer {
    n_states: usize,
    turnout: VoterTurnout,
    distance: DistanceToReality,
    assets: Assets,
    colors: AvgColorDistribution,
}

impl Analyzer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            n_states: 0,
            turnout: VoterTurnout::default(),
            distance: DistanceToReality::default(),
            assets: Assets::default(),
            colors: AvgColorDistribution::new(cfg),
        }
    }

    fn observables(&self) -> [&dyn Obs; 4] {
        [&self.turnout, &self.distance, &self.assets, &self.colors]
    }

    pub fn add_state(&mut self, state: &State) {
        let obs_vec: [&mut dyn Obs; 4] = [
            &mut self.turnout,
            &mut self.distance,
            &mut self.assets,
            &mut self.colors,
        ];
        for obs in obs_vec {
            obs.update(state);
        }
        self.n_states += 1;
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        let reports: Vec<_> = self.observables().iter().map(|obs| obs.report()).collect();
        serde_json::to_writer_pretty(writer, &reports).context("failed to serialize results")?;
        Ok(())
    }
}
