use serde::Serialize;

use crate::agent::AgentId;
use crate::collision::CollisionShapes;
use crate::config::{EvolutionConfig, SimConfig};
use crate::error::{ConfigError, SimError};
use crate::evaluation::{EvaluationLoop, Outcome};
use crate::evolution::{Evolver, Population};
use crate::reporting::FitnessSummary;
use crate::save_load;
use crate::stats::TrainingStats;

const HISTORY: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub generation: u32,
    pub score: u32,
    pub ticks: u64,
    pub fitness: FitnessSummary,
}

/// Drives generations: spawn controllers, evaluate, feed fitness back, evolve.
pub struct Trainer {
    pub sim_cfg: SimConfig,
    pub evo_cfg: EvolutionConfig,
    pub population: Population,
    pub stats: TrainingStats,
    pub reports: Vec<GenerationReport>,
    /// Sprite-derived masks; synthetic shapes when `None`.
    shapes: Option<CollisionShapes>,
}

impl Trainer {
    pub fn new(sim_cfg: SimConfig, evo_cfg: EvolutionConfig) -> Result<Self, ConfigError> {
        sim_cfg.validate()?;
        let population = Population::new(evo_cfg.clone(), 1.0 / sim_cfg.height, sim_cfg.seed)?;
        Ok(Self::resume(sim_cfg, evo_cfg, population))
    }

    /// Continue from a restored population. Selection settings stay as they were saved.
    pub fn resume(sim_cfg: SimConfig, evo_cfg: EvolutionConfig, population: Population) -> Self {
        Self {
            shapes: None,
            sim_cfg,
            evo_cfg,
            population,
            stats: TrainingStats::new(HISTORY),
            reports: Vec::new(),
        }
    }

    /// Evaluate with these masks instead of the synthetic defaults.
    pub fn with_shapes(mut self, shapes: CollisionShapes) -> Self {
        self.shapes = Some(shapes);
        self
    }

    pub fn generation(&self) -> u32 {
        self.population.generation()
    }

    /// Stop once the generation budget is spent or a champion crosses the threshold.
    pub fn is_done(&self) -> bool {
        if self.generation() >= self.evo_cfg.max_generations {
            return true;
        }
        self.population
            .best_fitness()
            .is_some_and(|f| f >= self.evo_cfg.fitness_threshold)
    }

    /// Build the evaluation for the current generation. Gates differ per generation.
    pub fn start_generation(&mut self) -> Result<EvaluationLoop, SimError> {
        let cfg = SimConfig {
            seed: self.sim_cfg.seed.wrapping_add(self.generation() as u64),
            ..self.sim_cfg.clone()
        };
        let controllers = self.population.controllers();
        match &self.shapes {
            Some(shapes) => EvaluationLoop::with_shapes(cfg, shapes.clone(), controllers),
            None => EvaluationLoop::new(cfg, controllers),
        }
    }

    /// Report every agent's fitness, log, checkpoint and evolve.
    pub fn finish_generation(&mut self, outcome: &Outcome) -> GenerationReport {
        for &(id, fitness) in &outcome.fitness {
            self.population.report_fitness(id, fitness);
        }
        let values: Vec<f32> = outcome.fitness.iter().map(|(_, f)| *f).collect();
        let report = GenerationReport {
            generation: self.generation(),
            score: outcome.score,
            ticks: outcome.ticks,
            fitness: FitnessSummary::from_values(&values),
        };

        log::info!(
            "generation {}: score {} in {} ticks, fitness best {:.1} mean {:.2} p90 {:.1}",
            report.generation,
            report.score,
            report.ticks,
            report.fitness.max,
            report.fitness.mean,
            report.fitness.p90
        );
        if let Some((id, _)) = best_agent(outcome) {
            log::debug!("generation {} best agent {id}", report.generation);
        }

        self.stats.record(&report);
        self.reports.push(report.clone());

        self.population.advance_generation();
        self.maybe_checkpoint();

        report
    }

    /// Evaluate one generation headlessly.
    pub fn run_generation(&mut self) -> Result<GenerationReport, SimError> {
        let mut sim = self.start_generation()?;
        let outcome = sim.run_to_end(Some(self.evo_cfg.tick_limit))?;
        Ok(self.finish_generation(&outcome))
    }

    /// Run generations until done. A controller failure aborts the whole run.
    pub fn run(&mut self) -> Result<&[GenerationReport], SimError> {
        while !self.is_done() {
            self.run_generation()?;
        }
        if let Some(best) = self.population.best_fitness() {
            log::info!(
                "training finished after {} generations, best fitness {best:.1}",
                self.generation()
            );
        }
        Ok(&self.reports)
    }

    fn maybe_checkpoint(&self) {
        let interval = self.evo_cfg.checkpoint_interval;
        let generation = self.generation();
        if interval == 0 || generation % interval != 0 {
            return;
        }
        let path = save_load::checkpoint_path(&self.evo_cfg.checkpoint_dir, generation);
        match save_load::save_to_file(&self.population, &path) {
            Ok(()) => log::info!("checkpoint written to {}", path.display()),
            Err(e) => log::warn!("checkpoint {} failed: {e}", path.display()),
        }
    }
}

fn best_agent(outcome: &Outcome) -> Option<(AgentId, f32)> {
    outcome
        .fitness
        .iter()
        .copied()
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::CollisionMask;

    fn quick_cfgs(dir: &str) -> (SimConfig, EvolutionConfig) {
        let evo = EvolutionConfig {
            population_size: 8,
            max_generations: 3,
            fitness_threshold: f32::MAX,
            checkpoint_interval: 2,
            checkpoint_dir: std::env::temp_dir().join(dir),
            tick_limit: 400,
            ..EvolutionConfig::default()
        };
        (SimConfig::default(), evo)
    }

    #[test]
    fn runs_until_generation_budget() {
        let (sim, evo) = quick_cfgs(&format!("flock_train_{}", std::process::id()));
        let dir = evo.checkpoint_dir.clone();
        let mut trainer = Trainer::new(sim, evo).unwrap();

        let reports = trainer.run().unwrap().to_vec();
        assert_eq!(reports.len(), 3);
        assert_eq!(trainer.generation(), 3);
        assert_eq!(trainer.reports.last().map(|r| r.generation), Some(2));
        for (i, r) in reports.iter().enumerate() {
            assert_eq!(r.generation, i as u32);
            assert_eq!(r.fitness.count, 8);
            assert!(r.ticks <= 400);
        }
        assert_eq!(trainer.stats.best_fitness.len(), 3);

        // Interval 2: a checkpoint after the second generation only.
        assert!(save_load::checkpoint_path(&dir, 2).exists());
        assert!(!save_load::checkpoint_path(&dir, 1).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn threshold_stops_training_early() {
        let (sim, mut evo) = quick_cfgs(&format!("flock_thresh_{}", std::process::id()));
        evo.fitness_threshold = f32::MIN;
        evo.checkpoint_interval = 0;
        let mut trainer = Trainer::new(sim, evo).unwrap();

        let reports = trainer.run().unwrap();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn custom_shapes_reach_every_generation() {
        let (sim, mut evo) = quick_cfgs("unused");
        evo.checkpoint_interval = 0;
        evo.max_generations = 1;
        // Tiny agent mask that can never touch a barrier.
        let shapes = CollisionShapes::with_masks(
            &sim,
            CollisionMask::solid(0, 0),
            CollisionMask::solid(sim.gate_width, sim.gate_barrier_height),
        );
        let mut trainer = Trainer::new(sim, evo).unwrap().with_shapes(shapes);

        assert_eq!(trainer.shapes.as_ref().map(|s| s.agent.width), Some(0));
        trainer.run().unwrap();
        assert_eq!(trainer.reports.len(), 1);
    }

    #[test]
    fn training_is_deterministic_for_a_seed() {
        let (sim, mut evo) = quick_cfgs("unused");
        evo.checkpoint_interval = 0;
        let mut a = Trainer::new(sim.clone(), evo.clone()).unwrap();
        let mut b = Trainer::new(sim, evo).unwrap();
        assert_eq!(a.run().unwrap(), b.run().unwrap());
    }
}
