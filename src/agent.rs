use std::fmt;

use macroquad::prelude::*;
use serde::{Deserialize, Serialize};

/// Stable handle to an agent for the lifetime of one generation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Agent {
    pub id: AgentId,
    /// Top-left of the agent's mask. `x` never changes after spawn.
    pub pos: Vec2,
    /// Vertical velocity set by the last jump (negative is up).
    pub velocity: f32,
    /// Ticks since the last jump.
    pub ticks_since_jump: u32,
    /// Height the last jump started from.
    pub jump_height: f32,
    /// Degrees, from -90 (nose down) to the configured maximum (nose up).
    pub tilt: f32,
    pub fitness: f32,
    pub alive: bool,
}

impl Agent {
    pub fn new(id: AgentId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            velocity: 0.0,
            ticks_since_jump: 0,
            jump_height: pos.y,
            tilt: 0.0,
            fitness: 0.0,
            alive: true,
        }
    }
}

/// Every agent spawned in a generation, live or removed.
///
/// Agents are never dropped mid-generation; removal only clears `alive`,
/// so ids stay valid and final fitness remains readable at the end.
#[derive(Clone, Debug, Default)]
pub struct AgentRoster {
    pub agents: Vec<Agent>,
    pub live_count: usize,
}

impl AgentRoster {
    pub fn new(count: usize, spawn: Vec2) -> Self {
        let agents = (0..count as u32)
            .map(|i| Agent::new(AgentId(i), spawn))
            .collect();
        Self {
            agents,
            live_count: count,
        }
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.0 as usize)
    }

    /// Iterate over all live agents in spawn order.
    pub fn iter_alive(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.alive)
    }

    pub fn iter_alive_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut().filter(|a| a.alive)
    }

    /// Ids of all live agents, collected so callers can mutate while walking them.
    pub fn live_ids(&self) -> Vec<AgentId> {
        self.iter_alive().map(|a| a.id).collect()
    }

    /// Apply a batch of removals gathered during a pass.
    ///
    /// Each id is charged `penalty` at most once, even if it appears more
    /// than once in `ids`. Returns the number of agents actually removed.
    pub fn remove_all(&mut self, ids: &[AgentId], penalty: f32) -> usize {
        let mut removed = 0;
        for id in ids {
            if let Some(agent) = self.get_mut(*id) {
                if agent.alive {
                    agent.alive = false;
                    agent.fitness -= penalty;
                    removed += 1;
                }
            }
        }
        self.live_count -= removed;
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_all_charges_each_agent_once() {
        let mut roster = AgentRoster::new(3, vec2(10.0, 20.0));
        let removed = roster.remove_all(&[AgentId(0), AgentId(2), AgentId(0)], 1.0);

        assert_eq!(removed, 2);
        assert_eq!(roster.live_count, 1);
        assert_eq!(roster.get(AgentId(0)).unwrap().fitness, -1.0);
        assert_eq!(roster.get(AgentId(2)).unwrap().fitness, -1.0);
        assert_eq!(roster.get(AgentId(1)).unwrap().fitness, 0.0);
    }

    #[test]
    fn iter_alive_skips_removed_agents() {
        let mut roster = AgentRoster::new(3, vec2(0.0, 0.0));
        roster.remove_all(&[AgentId(1)], 0.0);

        let live: Vec<AgentId> = roster.live_ids();
        assert_eq!(live, vec![AgentId(0), AgentId(2)]);
        assert_eq!(roster.agents.len(), 3);
        assert!(!roster.is_empty());
    }
}
