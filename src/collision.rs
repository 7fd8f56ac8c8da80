use crate::agent::Agent;
use crate::config::SimConfig;
use crate::gate::Gate;
use crate::ground::Ground;
use crate::mask::CollisionMask;

/// Masks and margins for agent-vs-obstacle tests.
///
/// Built from synthetic shapes by default: an ellipse for the agent and solid
/// rectangles for the barriers. Swap in sprite-derived masks via `with_masks`.
#[derive(Clone, Debug)]
pub struct CollisionShapes {
    pub agent: CollisionMask,
    pub top_barrier: CollisionMask,
    pub bottom_barrier: CollisionMask,
    pub ground_clearance: f32,
}

impl CollisionShapes {
    pub fn from_config(cfg: &SimConfig) -> Self {
        let barrier = CollisionMask::solid(cfg.gate_width, cfg.gate_barrier_height);
        Self {
            agent: CollisionMask::ellipse(cfg.agent_width, cfg.agent_height),
            top_barrier: barrier.flipped_vertical(),
            bottom_barrier: barrier,
            ground_clearance: cfg.ground_clearance,
        }
    }

    pub fn with_masks(cfg: &SimConfig, agent: CollisionMask, barrier: CollisionMask) -> Self {
        Self {
            agent,
            top_barrier: barrier.flipped_vertical(),
            bottom_barrier: barrier,
            ground_clearance: cfg.ground_clearance,
        }
    }

    /// Pixel-exact test against either barrier of `gate`.
    pub fn hits_gate(&self, agent: &Agent, gate: &Gate) -> bool {
        let dx = (gate.x - agent.pos.x) as i32;
        // Half-pixel heights are common after a jump; ties go to even.
        let ay = agent.pos.y.round_ties_even() as i32;
        let top_offset = (dx, gate.top_origin as i32 - ay);
        let bottom_offset = (dx, gate.gap_bottom as i32 - ay);

        self.agent.overlap(&self.top_barrier, top_offset).is_some()
            || self.agent.overlap(&self.bottom_barrier, bottom_offset).is_some()
    }

    pub fn hits_ground(&self, agent: &Agent, ground: &Ground) -> bool {
        agent.pos.y >= ground.y - self.ground_clearance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use macroquad::prelude::vec2;

    fn setup() -> (SimConfig, CollisionShapes) {
        let cfg = SimConfig::default();
        let shapes = CollisionShapes::from_config(&cfg);
        (cfg, shapes)
    }

    #[test]
    fn agent_inside_gap_does_not_collide() {
        let (cfg, shapes) = setup();
        let gate = Gate::with_gap_height(200.0, 200, &cfg);
        // Gap spans y 200..390; agent mask is 48 high.
        let agent = Agent::new(AgentId(0), vec2(225.0, 270.0));
        assert!(!shapes.hits_gate(&agent, &gate));
    }

    #[test]
    fn agent_overlapping_either_barrier_collides() {
        let (cfg, shapes) = setup();
        let gate = Gate::with_gap_height(200.0, 200, &cfg);
        let high = Agent::new(AgentId(0), vec2(225.0, 180.0));
        let low = Agent::new(AgentId(1), vec2(225.0, 360.0));
        assert!(shapes.hits_gate(&high, &gate));
        assert!(shapes.hits_gate(&low, &gate));
    }

    #[test]
    fn agent_clear_of_gate_horizontally_does_not_collide() {
        let (cfg, shapes) = setup();
        let gate = Gate::with_gap_height(300.0, 200, &cfg);
        let agent = Agent::new(AgentId(0), vec2(225.0, 100.0));
        assert!(!shapes.hits_gate(&agent, &gate));
    }

    #[test]
    fn ground_threshold_includes_clearance() {
        let (cfg, shapes) = setup();
        let ground = Ground::new(&cfg);
        assert!(!shapes.hits_ground(&Agent::new(AgentId(0), vec2(225.0, 659.9)), &ground));
        assert!(shapes.hits_ground(&Agent::new(AgentId(0), vec2(225.0, 660.0)), &ground));
    }

    #[test]
    fn half_pixel_height_rounds_to_even_row() {
        let (cfg, shapes) = setup();
        let gate = Gate::with_gap_height(200.0, 200, &cfg);
        // 342.5 rounds to 342, leaving the bottom barrier 48 rows down: just clear.
        let agent = Agent::new(AgentId(0), vec2(225.0, 342.5));
        assert!(!shapes.hits_gate(&agent, &gate));

        // 343.5 rounds to 344 and the lowest ellipse row reaches the barrier.
        let lower = Agent::new(AgentId(1), vec2(225.0, 343.5));
        assert!(shapes.hits_gate(&lower, &gate));
    }

    #[test]
    fn bounding_box_corner_contact_misses_ellipse() {
        let (cfg, shapes) = setup();
        // Bottom barrier starts at y=390; agent's lower-left corner dips 2px into it
        // while the gate's right edge is only 2px into the agent's box.
        let gate = Gate::with_gap_height(225.0 - 104.0 + 2.0, 200, &cfg);
        let agent = Agent::new(AgentId(0), vec2(225.0, 390.0 - 48.0 + 2.0));
        assert!(!shapes.hits_gate(&agent, &gate));
    }
}
