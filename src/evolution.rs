use ::rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::agent::AgentId;
use crate::config::EvolutionConfig;
use crate::controller::Controller;
use crate::error::ConfigError;
use crate::genome::Genome;
use crate::network::{Network, NeuralController};

/// The optimizer as seen from the evaluation harness.
///
/// One generation: `controllers()` once, run the evaluation, `report_fitness`
/// for every agent, then `advance_generation()`.
pub trait Evolver {
    /// One controller per agent; `AgentId(i)` maps to the i-th controller.
    fn controllers(&mut self) -> Vec<Box<dyn Controller>>;
    fn report_fitness(&mut self, agent: AgentId, fitness: f32);
    fn advance_generation(&mut self);
    fn generation(&self) -> u32;
}

/// Fixed-topology genetic population with elitism and tournament selection.
#[derive(Clone, Debug)]
pub struct Population {
    pub cfg: EvolutionConfig,
    pub genomes: Vec<Genome>,
    pub fitness: Vec<f32>,
    pub generation: u32,
    /// Best genome seen across all generations and its fitness.
    pub champion: Option<(Genome, f32)>,
    pub input_scale: f32,
    pub rng: ChaCha8Rng,
}

impl Population {
    pub fn new(cfg: EvolutionConfig, input_scale: f32, seed: u64) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let genomes = (0..cfg.population_size)
            .map(|_| Genome::random(cfg.hidden_neurons, &mut rng))
            .collect();
        Ok(Self {
            fitness: vec![0.0; cfg.population_size],
            genomes,
            generation: 0,
            champion: None,
            input_scale,
            rng,
            cfg,
        })
    }

    pub fn best_fitness(&self) -> Option<f32> {
        self.champion.as_ref().map(|(_, f)| *f)
    }

    /// Indices sorted by this generation's fitness, best first.
    fn ranked(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.genomes.len()).collect();
        order.sort_by(|a, b| self.fitness[*b].total_cmp(&self.fitness[*a]));
        order
    }

    fn tournament(&mut self) -> usize {
        let n = self.genomes.len();
        let mut best = self.rng.gen_range(0..n);
        for _ in 1..self.cfg.tournament_size {
            let challenger = self.rng.gen_range(0..n);
            if self.fitness[challenger] > self.fitness[best] {
                best = challenger;
            }
        }
        best
    }
}

impl Evolver for Population {
    fn controllers(&mut self) -> Vec<Box<dyn Controller>> {
        self.genomes
            .iter()
            .map(|g| {
                Box::new(NeuralController::new(Network::from_genome(g, self.input_scale)))
                    as Box<dyn Controller>
            })
            .collect()
    }

    fn report_fitness(&mut self, agent: AgentId, fitness: f32) {
        if let Some(slot) = self.fitness.get_mut(agent.0 as usize) {
            *slot = fitness;
        }
    }

    fn advance_generation(&mut self) {
        let ranked = self.ranked();

        if let Some(&best) = ranked.first() {
            let f = self.fitness[best];
            if self.best_fitness().map_or(true, |prev| f > prev) {
                self.champion = Some((self.genomes[best].clone(), f));
            }
        }

        let mut next = Vec::with_capacity(self.genomes.len());
        for &idx in ranked.iter().take(self.cfg.elitism) {
            next.push(self.genomes[idx].clone());
        }
        while next.len() < self.genomes.len() {
            let parent = self.tournament();
            let child =
                self.genomes[parent].mutate(self.cfg.mutation_rate, self.cfg.mutation_sigma, &mut self.rng);
            next.push(child);
        }

        self.genomes = next;
        self.fitness.iter_mut().for_each(|f| *f = 0.0);
        self.generation += 1;
    }

    fn generation(&self) -> u32 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cfg() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 6,
            elitism: 2,
            ..EvolutionConfig::default()
        }
    }

    #[test]
    fn new_population_has_one_genome_per_slot() {
        let mut pop = Population::new(small_cfg(), 1.0 / 800.0, 1).unwrap();
        assert_eq!(pop.genomes.len(), 6);
        assert_eq!(pop.controllers().len(), 6);
        assert!(pop.genomes.iter().all(Genome::is_well_formed));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = EvolutionConfig {
            population_size: 0,
            ..EvolutionConfig::default()
        };
        assert!(matches!(
            Population::new(cfg, 1.0, 0),
            Err(ConfigError::Population)
        ));
    }

    #[test]
    fn elites_survive_and_champion_is_tracked() {
        let mut pop = Population::new(small_cfg(), 1.0, 5).unwrap();
        for (i, f) in [1.0, 9.0, 3.0, 7.0, 0.0, 2.0].into_iter().enumerate() {
            pop.report_fitness(AgentId(i as u32), f);
        }
        let best = pop.genomes[1].clone();
        let second = pop.genomes[3].clone();

        pop.advance_generation();

        assert_eq!(pop.generation(), 1);
        assert_eq!(pop.genomes[0], best);
        assert_eq!(pop.genomes[1], second);
        assert_eq!(pop.genomes.len(), 6);
        assert_eq!(pop.best_fitness(), Some(9.0));
        assert!(pop.fitness.iter().all(|f| *f == 0.0));
    }

    #[test]
    fn champion_only_improves() {
        let mut pop = Population::new(small_cfg(), 1.0, 6).unwrap();
        pop.report_fitness(AgentId(0), 10.0);
        pop.advance_generation();
        pop.report_fitness(AgentId(0), 4.0);
        pop.advance_generation();
        assert_eq!(pop.best_fitness(), Some(10.0));
    }

    #[test]
    fn same_seed_evolves_identically() {
        let mut a = Population::new(small_cfg(), 1.0, 77).unwrap();
        let mut b = Population::new(small_cfg(), 1.0, 77).unwrap();
        for pop in [&mut a, &mut b] {
            for i in 0..6 {
                pop.report_fitness(AgentId(i), i as f32);
            }
            pop.advance_generation();
        }
        assert_eq!(a.genomes, b.genomes);
    }
}
