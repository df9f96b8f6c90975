use crate::agent::max_personalities;
use crate::aggregator::Aggregator;
use crate::area::ElectionRules;
use crate::distance::DistanceMetric;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model parameters.
    pub model: ModelConfig,
    /// Initialization parameters.
    pub init: InitConfig,
    /// Output parameters.
    pub output: OutputConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of grid rows.
    pub height: usize,
    /// Number of grid columns.
    pub width: usize,
    /// Number of colors (the first one is the neutral color).
    pub num_colors: usize,

    /// Number of election areas.
    pub num_areas: usize,
    /// Average area height.
    pub av_area_height: usize,
    /// Average area width.
    pub av_area_width: usize,
    /// Relative spread of the area sizes.
    pub area_size_variance: f64,

    /// Assets an agent pays to vote.
    pub election_cost: f64,
    /// Scale of the rewards handed out after an election.
    pub max_reward: f64,
    /// Fraction of an area's cells mutated after an election.
    pub mu: f64,
    /// Exponent biasing mutations toward the winning colors.
    pub election_impact: f64,
    /// Probability that an eligible agent votes.
    pub participation_prob: f64,
    /// Number of area cells an agent knows when voting.
    pub known_cells: usize,

    /// Social welfare function.
    pub voting_rule: Aggregator,
    /// Distance between rankings.
    pub distance: DistanceMetric,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    /// Number of voting agents.
    pub num_agents: usize,
    /// Size of the personality pool.
    pub num_personalities: usize,
    /// Number of colors ranked by each personality.
    pub num_personality_colors: usize,
    /// Initial assets of every agent.
    pub assets: f64,

    /// Spread of the global color distribution.
    pub heterogeneity: f64,
    /// Number of color patch sweeps.
    pub color_patches_steps: usize,
    /// Strength of the color patches.
    pub patch_power: f64,

    /// Random seed (drawn from the OS when missing).
    pub seed: Option<u64>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of steps between simulation saves.
    pub steps_per_save: usize,
    /// Number of saves per run invocation.
    pub saves_per_run: usize,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Election rules shared by every area.
    pub fn election_rules(&self) -> ElectionRules {
        ElectionRules {
            voting_rule: self.model.voting_rule,
            distance: self.model.distance,
            election_cost: self.model.election_cost,
            max_reward: self.model.max_reward,
            mu: self.model.mu,
            election_impact: self.model.election_impact,
            participation_prob: self.model.participation_prob,
            known_cells: self.model.known_cells,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let model = &self.model;
        check_num(model.height, 1..10_000).context("invalid grid height")?;
        check_num(model.width, 1..10_000).context("invalid grid width")?;
        check_num(model.num_colors, 2..=8).context("invalid number of colors")?;

        check_num(model.num_areas, 1..10_000).context("invalid number of areas")?;
        check_num(model.av_area_height, 1..=model.height).context("invalid average area height")?;
        check_num(model.av_area_width, 1..=model.width).context("invalid average area width")?;
        check_num(model.area_size_variance, 0.0..=1.0).context("invalid area size variance")?;

        check_num(model.election_cost, 0.0..1e9).context("invalid election cost")?;
        check_num(model.max_reward, 0.0..1e9).context("invalid maximum reward")?;
        check_num(model.mu, 0.0..=1.0).context("invalid mutation rate")?;
        check_num(model.election_impact, 0.0..100.0).context("invalid election impact")?;
        check_num(model.participation_prob, 0.0..=1.0)
            .context("invalid participation probability")?;
        check_num(model.known_cells, 0..1_000_000).context("invalid number of known cells")?;

        let init = &self.init;
        check_num(init.num_agents, 0..1_000_000).context("invalid number of agents")?;
        check_num(init.num_personality_colors, 1..model.num_colors)
            .context("invalid number of personality colors")?;
        let max_pers = max_personalities(model.num_colors, init.num_personality_colors);
        check_num(init.num_personalities, 1..=max_pers)
            .context("invalid number of personalities")?;
        check_num(init.assets, 0.0..1e9).context("invalid initial assets")?;
        check_num(init.heterogeneity, 0.0..=1.0).context("invalid heterogeneity")?;
        check_num(init.color_patches_steps, 0..10_000)
            .context("invalid number of color patch steps")?;
        check_num(init.patch_power, 0.0..100.0).context("invalid patch power")?;

        check_num(self.output.steps_per_save, 1..10_000)
            .context("invalid number of steps per save")?;
        check_num(self.output.saves_per_run, 1..10_000)
            .context("invalid number of saves per run")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
