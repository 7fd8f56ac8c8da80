use ::rand::SeedableRng;
use macroquad::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::agent::{Agent, AgentId, AgentRoster};
use crate::collision::CollisionShapes;
use crate::config::SimConfig;
use crate::controller::{Controller, Observation};
use crate::error::{ConfigError, SimError};
use crate::gate::Gate;
use crate::ground::Ground;
use crate::kinematics::Kinematics;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunState {
    Running,
    Terminal,
}

/// Final result of a generation, one fitness entry per agent ever spawned.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Outcome {
    pub score: u32,
    pub ticks: u64,
    pub fitness: Vec<(AgentId, f32)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentView {
    pub id: AgentId,
    pub pos: Vec2,
    pub tilt: f32,
    pub fitness: f32,
    pub alive: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GateView {
    pub x: f32,
    pub width: f32,
    pub gap_top: f32,
    pub gap_bottom: f32,
    pub passed: bool,
}

/// Read-only picture of the run for renderers and HUDs.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub tick: u64,
    pub score: u32,
    pub state: RunState,
    pub live: usize,
    pub agents: Vec<AgentView>,
    pub gates: Vec<GateView>,
    pub ground: [f32; 2],
    pub ground_y: f32,
    pub ground_width: f32,
}

/// Advances a whole population of agents in lock-step until none remain.
pub struct EvaluationLoop {
    cfg: SimConfig,
    kinematics: Kinematics,
    shapes: CollisionShapes,
    roster: AgentRoster,
    /// Indexed by `AgentId`; never compacted.
    controllers: Vec<Box<dyn Controller>>,
    gates: Vec<Gate>,
    ground: Ground,
    rng: ChaCha8Rng,
    score: u32,
    tick_count: u64,
    gates_retired: u32,
    state: RunState,
}

impl EvaluationLoop {
    /// Validate `cfg` and spawn one agent per controller plus the first gate.
    pub fn new(cfg: SimConfig, controllers: Vec<Box<dyn Controller>>) -> Result<Self, SimError> {
        let shapes = CollisionShapes::from_config(&cfg);
        Self::with_shapes(cfg, shapes, controllers)
    }

    pub fn with_shapes(
        cfg: SimConfig,
        shapes: CollisionShapes,
        controllers: Vec<Box<dyn Controller>>,
    ) -> Result<Self, SimError> {
        cfg.validate()?;
        if controllers.is_empty() {
            return Err(ConfigError::Population.into());
        }

        let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
        let roster = AgentRoster::new(controllers.len(), vec2(cfg.spawn_x, cfg.spawn_y));
        let gates = vec![Gate::spawn(cfg.width, &cfg, &mut rng)];
        let ground = Ground::new(&cfg);

        log::debug!(
            "evaluation start: {} agents, seed {}",
            controllers.len(),
            cfg.seed
        );

        Ok(Self {
            kinematics: Kinematics::from_config(&cfg),
            shapes,
            roster,
            controllers,
            gates,
            ground,
            rng,
            score: 0,
            tick_count: 0,
            gates_retired: 0,
            state: RunState::Running,
            cfg,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Nearest gate not yet passed; agents always react to this one.
    pub fn active_gate(&self) -> Option<&Gate> {
        self.gates
            .iter()
            .find(|g| !g.passed)
            .or_else(|| self.gates.last())
    }

    pub fn observe(&self, agent: &Agent) -> Observation {
        let y = agent.pos.y;
        match self.active_gate() {
            Some(gate) => Observation {
                self_y: y,
                dist_to_top: (y - gate.gap_top).abs(),
                dist_to_bottom: (y - gate.gap_bottom).abs(),
            },
            None => Observation {
                self_y: y,
                dist_to_top: y,
                dist_to_bottom: (self.cfg.height - y).abs(),
            },
        }
    }

    /// Resolve one full tick. A no-op once the run is terminal.
    ///
    /// A controller failure aborts the tick before any agent, gate or score
    /// changes. Controllers already queried this tick keep their own side
    /// effects, such as a consumed [`JumpLatch`](crate::controller::JumpLatch).
    pub fn tick(&mut self) -> Result<RunState, SimError> {
        if self.state == RunState::Terminal {
            return Ok(RunState::Terminal);
        }

        // Decisions first, against the pre-tick state.
        let live = self.roster.live_ids();
        let mut decisions = Vec::with_capacity(live.len());
        for &id in &live {
            let obs = match self.roster.get(id) {
                Some(agent) => self.observe(agent),
                None => continue,
            };
            let jump = self.controllers[id.0 as usize]
                .decide(&obs)
                .map_err(|source| SimError::Controller { agent: id, source })?;
            decisions.push((id, jump));
        }

        // Kinematics
        for (id, jump) in decisions {
            if let Some(agent) = self.roster.get_mut(id) {
                self.kinematics.advance(agent);
                if jump {
                    self.kinematics.jump(agent);
                }
                agent.fitness += self.cfg.survival_reward;
            }
        }

        // Gate collisions: gather, then remove after the full pass.
        let mut hits = Vec::new();
        for gate in &self.gates {
            for agent in self.roster.iter_alive() {
                if self.shapes.hits_gate(agent, gate) {
                    hits.push(agent.id);
                }
            }
        }
        let removed = self.roster.remove_all(&hits, self.cfg.collision_penalty);
        if removed > 0 {
            log::trace!("tick {}: {removed} agents hit a gate", self.tick_count);
        }

        // Passing. Agents above the playfield when the gate goes by do not clear it.
        let mut spawn_gate = false;
        let mut over_top = Vec::new();
        for gate in self.gates.iter_mut().filter(|g| !g.passed) {
            let mut cleared = false;
            for agent in self.roster.iter_alive() {
                if gate.is_passed_by(agent) {
                    if agent.pos.y < 0.0 {
                        over_top.push(agent.id);
                    } else {
                        cleared = true;
                    }
                }
            }
            if cleared {
                gate.passed = true;
                self.score += 1;
                spawn_gate = true;
            }
        }
        if !over_top.is_empty() {
            let removed = self
                .roster
                .remove_all(&over_top, self.cfg.collision_penalty);
            log::trace!("tick {}: {removed} agents flew over a gate", self.tick_count);
        }

        // Scroll obstacles and floor together.
        let velocity = self.cfg.scroll_velocity;
        for gate in &mut self.gates {
            gate.advance(velocity);
        }
        self.ground.advance(velocity);
        debug_assert!(self.ground.covers(self.cfg.width));
        let before = self.gates.len();
        self.gates.retain(|g| !g.is_retired());
        self.gates_retired += (before - self.gates.len()) as u32;

        if spawn_gate {
            let gate = Gate::spawn(self.cfg.width, &self.cfg, &mut self.rng);
            log::debug!(
                "tick {}: score {}, next gap at {}",
                self.tick_count,
                self.score,
                gate.gap_top
            );
            self.gates.push(gate);
            for agent in self.roster.iter_alive_mut() {
                agent.fitness += self.cfg.gate_bonus;
            }
        }

        // Ground
        let grounded: Vec<AgentId> = self
            .roster
            .iter_alive()
            .filter(|a| self.shapes.hits_ground(a, &self.ground))
            .map(|a| a.id)
            .collect();
        self.roster.remove_all(&grounded, self.cfg.ground_penalty);

        self.tick_count += 1;

        if self.roster.is_empty() {
            self.state = RunState::Terminal;
            log::debug!(
                "evaluation terminal after {} ticks, score {}, {} gates retired",
                self.tick_count,
                self.score,
                self.gates_retired
            );
        }
        Ok(self.state)
    }

    /// Final score and every agent's fitness, once terminal.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.state != RunState::Terminal {
            return None;
        }
        Some(Outcome {
            score: self.score,
            ticks: self.tick_count,
            fitness: self
                .roster
                .agents
                .iter()
                .map(|a| (a.id, a.fitness))
                .collect(),
        })
    }

    /// Tick until terminal. `max_ticks` bounds runaway controllers; when hit,
    /// every surviving agent is retired without penalty so the run still ends.
    pub fn run_to_end(&mut self, max_ticks: Option<u64>) -> Result<Outcome, SimError> {
        loop {
            if self.tick()? == RunState::Terminal {
                break;
            }
            if max_ticks.is_some_and(|max| self.tick_count >= max) {
                self.retire_survivors();
                break;
            }
        }
        // Terminal was just established above.
        Ok(self.outcome().unwrap_or(Outcome {
            score: self.score,
            ticks: self.tick_count,
            fitness: Vec::new(),
        }))
    }

    /// End the run now. Survivors keep the fitness they have earned.
    pub fn retire_survivors(&mut self) {
        if self.state == RunState::Terminal {
            return;
        }
        log::info!(
            "run cut at tick {} with {} agents alive",
            self.tick_count,
            self.roster.live_count
        );
        let survivors = self.roster.live_ids();
        self.roster.remove_all(&survivors, 0.0);
        self.state = RunState::Terminal;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick_count,
            score: self.score,
            state: self.state,
            live: self.roster.live_count,
            agents: self
                .roster
                .agents
                .iter()
                .map(|a| AgentView {
                    id: a.id,
                    pos: a.pos,
                    tilt: a.tilt,
                    fitness: a.fitness,
                    alive: a.alive,
                })
                .collect(),
            gates: self
                .gates
                .iter()
                .map(|g| GateView {
                    x: g.x,
                    width: g.width,
                    gap_top: g.gap_top,
                    gap_bottom: g.gap_bottom,
                    passed: g.passed,
                })
                .collect(),
            ground: [self.ground.x1, self.ground.x2],
            ground_y: self.ground.y,
            ground_width: self.ground.segment_width,
        }
    }
}
