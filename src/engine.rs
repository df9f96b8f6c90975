use crate::analysis::Analyzer;
use crate::config::Config;
use crate::world::World;
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Simulation engine.
///
/// Holds the configuration, the world, the running observables and the
/// random number generator, and provides methods to initialize, run, save,
/// and load simulations.
#[derive(Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    world: World,
    analyzer: Analyzer,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with the given configuration and a random initial world.
    ///
    /// The generator is seeded from `init.seed` if set, else from the OS.
    pub fn generate_initial_condition(cfg: Config) -> Result<Self> {
        let mut rng = match cfg.init.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };

        let world = World::generate(&cfg, &mut rng).context("failed to generate world")?;
        let analyzer = Analyzer::new(&cfg);

        Ok(Self {
            cfg,
            world,
            analyzer,
            rng,
        })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Perform the simulation, overwriting `file` with the latest state at every save.
    ///
    /// The observables are updated after every tick.
    pub fn perform_simulation<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();

        for i_save in 0..self.cfg.output.saves_per_run {
            for _ in 0..self.cfg.output.steps_per_save {
                self.world
                    .step(&mut self.rng)
                    .context("failed to perform step")?;
                self.analyzer.add_state(&self.world.state());
            }

            let state = self.world.state();
            save_snapshot(file, &state).context("failed to save snapshot")?;

            let progress = 100.0 * (i_save + 1) as f64 / self.cfg.output.saves_per_run as f64;
            log::info!("completed {progress:06.2}% (tick {})", state.tick);
        }

        Ok(())
    }

    /// Save a checkpoint of the entire engine state.
    ///
    /// Can be used to resume the simulation later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize engine")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let engine = decode::from_read(&mut reader).context("failed to deserialize engine")?;
        Ok(engine)
    }
}

fn save_snapshot<T: Serialize>(file: &Path, state: &T) -> Result<()> {
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    encode::write(&mut writer, state).context("failed to serialize state")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}
