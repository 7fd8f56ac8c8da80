use std::path::{Path, PathBuf};

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::EvolutionConfig;
use crate::error::CheckpointError;
use crate::evolution::Population;
use crate::genome::Genome;

const CHECKPOINT_VERSION: u32 = 1;

/// Everything needed to continue evolution from a generation boundary.
#[derive(Clone, Serialize, Deserialize)]
struct PopulationCheckpoint {
    version: u32,
    generation: u32,
    cfg: EvolutionConfig,
    genomes: Vec<Genome>,
    champion: Option<(Genome, f32)>,
    input_scale: f32,
    rng: ChaCha8Rng,
}

impl PopulationCheckpoint {
    fn from_population(pop: &Population) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            generation: pop.generation,
            cfg: pop.cfg.clone(),
            genomes: pop.genomes.clone(),
            champion: pop.champion.clone(),
            input_scale: pop.input_scale,
            rng: pop.rng.clone(),
        }
    }

    fn restore(self) -> Result<Population, CheckpointError> {
        if self.genomes.len() != self.cfg.population_size {
            return Err(CheckpointError::Corrupt(format!(
                "{} genomes for population size {}",
                self.genomes.len(),
                self.cfg.population_size
            )));
        }
        if let Some(bad) = self.genomes.iter().position(|g| !g.is_well_formed()) {
            return Err(CheckpointError::Corrupt(format!(
                "genome {bad} does not match its topology"
            )));
        }

        Ok(Population {
            fitness: vec![0.0; self.genomes.len()],
            genomes: self.genomes,
            generation: self.generation,
            champion: self.champion,
            input_scale: self.input_scale,
            rng: self.rng,
            cfg: self.cfg,
        })
    }
}

/// Conventional file name for a generation's checkpoint inside `dir`.
pub fn checkpoint_path(dir: &Path, generation: u32) -> PathBuf {
    dir.join(format!("flock-checkpoint-{generation}.bin"))
}

/// Save the population to a file.
pub fn save_to_file(pop: &Population, path: &Path) -> Result<(), CheckpointError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = bincode::serialize(&PopulationCheckpoint::from_population(pop))?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Load a population saved by [`save_to_file`].
pub fn load_from_file(path: &Path) -> Result<Population, CheckpointError> {
    let bytes = std::fs::read(path)?;

    // The version is the leading field, so it decodes on its own.
    let version: u32 = bincode::deserialize(&bytes)?;
    if version != CHECKPOINT_VERSION {
        return Err(CheckpointError::Version {
            found: version,
            expected: CHECKPOINT_VERSION,
        });
    }

    bincode::deserialize::<PopulationCheckpoint>(&bytes)?.restore()
}
