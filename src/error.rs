use std::path::PathBuf;

use thiserror::Error;

use crate::agent::AgentId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("playfield must have positive size, got {width}x{height}")]
    Playfield { width: f32, height: f32 },
    #[error("tick rate must be positive")]
    TickRate,
    #[error("gap range [{min}, {max}) is empty or negative")]
    GapRange { min: i32, max: i32 },
    #[error("gap of {gap} with heights up to {max} does not fit a playfield {height} high")]
    GapOverflow { gap: f32, max: i32, height: f32 },
    #[error("scroll velocity {velocity} or ground segment width {segment_width} cannot cover the playfield")]
    Scroll { velocity: f32, segment_width: f32 },
    #[error("population size must be positive")]
    Population,
    #[error("elitism {elitism} / tournament {tournament} invalid for population {population}")]
    Selection {
        elitism: usize,
        tournament: usize,
        population: usize,
    },
    #[error("mutation rate {rate} must be in [0, 1] and sigma {sigma} non-negative")]
    Mutation { rate: f32, sigma: f32 },
    #[error("read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("mask image {}: {message}", path.display())]
    Mask { path: PathBuf, message: String },
    #[error("parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Raised by a controller that cannot produce a decision.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ControllerError(pub String);

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error("controller for agent {agent} failed: {source}")]
    Controller {
        agent: AgentId,
        #[source]
        source: ControllerError,
    },
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint io: {0}")]
    Io(#[from] std::io::Error),
    #[error("checkpoint encoding: {0}")]
    Encode(#[from] bincode::Error),
    #[error("checkpoint version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("checkpoint is corrupt: {0}")]
    Corrupt(String),
}
