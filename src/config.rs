// All tunable simulation constants in one place.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Playfield
pub const PLAYFIELD_WIDTH: f32 = 500.0;
pub const PLAYFIELD_HEIGHT: f32 = 800.0;
pub const TICK_RATE: u32 = 30;

// Agent
pub const AGENT_SPAWN_X: f32 = PLAYFIELD_WIDTH / 2.0 - 25.0;
pub const AGENT_SPAWN_Y: f32 = PLAYFIELD_HEIGHT / 2.0 - 100.0;
pub const AGENT_WIDTH: u32 = 68;
pub const AGENT_HEIGHT: u32 = 48;

// Kinematics
pub const JUMP_VELOCITY: f32 = -10.5;
pub const GRAVITY: f32 = 1.5;
pub const TERMINAL_DISPLACEMENT: f32 = 16.0;
pub const UPWARD_BOOST: f32 = 2.0;
pub const MAX_TILT: f32 = 25.0;
pub const MIN_TILT: f32 = -90.0;
pub const TILT_RATE: f32 = 20.0;
pub const TILT_HOLD_MARGIN: f32 = 50.0;

// Gates
pub const GATE_WIDTH: u32 = 104;
pub const GATE_BARRIER_HEIGHT: u32 = 640;
pub const GATE_GAP: f32 = 190.0;
pub const GATE_GAP_MIN: i32 = 80;
pub const GATE_GAP_MAX: i32 = 450;
pub const SCROLL_VELOCITY: f32 = 5.0;

// Ground
pub const GROUND_OFFSET: f32 = 100.0;
pub const GROUND_SEGMENT_WIDTH: f32 = 672.0;
pub const GROUND_CLEARANCE: f32 = 40.0;

// Fitness
pub const SURVIVAL_REWARD: f32 = 0.1;
pub const COLLISION_PENALTY: f32 = 1.0;
pub const GATE_BONUS: f32 = 5.0;
pub const GROUND_PENALTY: f32 = 0.0;

// Evolution
pub const POPULATION_SIZE: usize = 50;
pub const MAX_GENERATIONS: u32 = 30;
pub const FITNESS_THRESHOLD: f32 = 100.0;
pub const MUTATION_RATE: f32 = 0.2;
pub const MUTATION_SIGMA: f32 = 0.15;
pub const ELITISM: usize = 2;
pub const TOURNAMENT_SIZE: usize = 3;
pub const HIDDEN_NEURONS: usize = 4;
pub const CHECKPOINT_INTERVAL: u32 = 5;
pub const JUMP_THRESHOLD: f32 = 0.5;
pub const TICK_LIMIT: u64 = 20_000;

// Front end
pub const AUTOPILOT_MARGIN: f32 = 82.0;

/// Playfield geometry, physics and fitness constants for one generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: f32,
    pub height: f32,
    pub tick_rate: u32,
    pub seed: u64,

    pub spawn_x: f32,
    pub spawn_y: f32,
    pub agent_width: u32,
    pub agent_height: u32,

    pub jump_velocity: f32,
    pub gravity: f32,
    pub terminal_displacement: f32,
    pub upward_boost: f32,
    pub max_tilt: f32,
    pub tilt_rate: f32,
    pub tilt_hold_margin: f32,

    pub gate_width: u32,
    pub gate_barrier_height: u32,
    pub gate_gap: f32,
    pub gap_min: i32,
    pub gap_max: i32,
    pub scroll_velocity: f32,

    pub ground_offset: f32,
    pub ground_segment_width: f32,
    pub ground_clearance: f32,

    pub survival_reward: f32,
    pub collision_penalty: f32,
    pub gate_bonus: f32,
    pub ground_penalty: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
            tick_rate: TICK_RATE,
            seed: 42,
            spawn_x: AGENT_SPAWN_X,
            spawn_y: AGENT_SPAWN_Y,
            agent_width: AGENT_WIDTH,
            agent_height: AGENT_HEIGHT,
            jump_velocity: JUMP_VELOCITY,
            gravity: GRAVITY,
            terminal_displacement: TERMINAL_DISPLACEMENT,
            upward_boost: UPWARD_BOOST,
            max_tilt: MAX_TILT,
            tilt_rate: TILT_RATE,
            tilt_hold_margin: TILT_HOLD_MARGIN,
            gate_width: GATE_WIDTH,
            gate_barrier_height: GATE_BARRIER_HEIGHT,
            gate_gap: GATE_GAP,
            gap_min: GATE_GAP_MIN,
            gap_max: GATE_GAP_MAX,
            scroll_velocity: SCROLL_VELOCITY,
            ground_offset: GROUND_OFFSET,
            ground_segment_width: GROUND_SEGMENT_WIDTH,
            ground_clearance: GROUND_CLEARANCE,
            survival_reward: SURVIVAL_REWARD,
            collision_penalty: COLLISION_PENALTY,
            gate_bonus: GATE_BONUS,
            ground_penalty: GROUND_PENALTY,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigError::Playfield {
                width: self.width,
                height: self.height,
            });
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::TickRate);
        }
        if self.gap_min < 0 || self.gap_min >= self.gap_max {
            return Err(ConfigError::GapRange {
                min: self.gap_min,
                max: self.gap_max,
            });
        }
        // Both barriers must keep a non-negative extent for every sampled gap height.
        if (self.gap_max - 1) as f32 + self.gate_gap > self.height || self.gate_gap <= 0.0 {
            return Err(ConfigError::GapOverflow {
                gap: self.gate_gap,
                max: self.gap_max,
                height: self.height,
            });
        }
        if self.scroll_velocity <= 0.0 || self.ground_segment_width < self.width {
            return Err(ConfigError::Scroll {
                velocity: self.scroll_velocity,
                segment_width: self.ground_segment_width,
            });
        }
        Ok(())
    }

    pub fn ground_y(&self) -> f32 {
        self.height - self.ground_offset
    }

    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.tick_rate.max(1) as f64
    }
}

/// Population and optimizer settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub max_generations: u32,
    pub fitness_threshold: f32,
    pub mutation_rate: f32,
    pub mutation_sigma: f32,
    pub elitism: usize,
    pub tournament_size: usize,
    pub hidden_neurons: usize,
    pub checkpoint_interval: u32,
    pub checkpoint_dir: PathBuf,
    /// Ticks after which a generation is cut short with its survivors' fitness as is.
    pub tick_limit: u64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: POPULATION_SIZE,
            max_generations: MAX_GENERATIONS,
            fitness_threshold: FITNESS_THRESHOLD,
            mutation_rate: MUTATION_RATE,
            mutation_sigma: MUTATION_SIGMA,
            elitism: ELITISM,
            tournament_size: TOURNAMENT_SIZE,
            hidden_neurons: HIDDEN_NEURONS,
            checkpoint_interval: CHECKPOINT_INTERVAL,
            checkpoint_dir: PathBuf::from("checkpoints"),
            tick_limit: TICK_LIMIT,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::Population);
        }
        if self.elitism > self.population_size || self.tournament_size == 0 {
            return Err(ConfigError::Selection {
                elitism: self.elitism,
                tournament: self.tournament_size,
                population: self.population_size,
            });
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) || self.mutation_sigma < 0.0 {
            return Err(ConfigError::Mutation {
                rate: self.mutation_rate,
                sigma: self.mutation_sigma,
            });
        }
        Ok(())
    }
}

/// On-disk layout of a `--config` file. Either section may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub sim: SimConfig,
    pub evolution: EvolutionConfig,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        file.sim.validate()?;
        file.evolution.validate()?;
        Ok(file)
    }
}
