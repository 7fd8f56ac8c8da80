use ::rand::Rng;

use crate::agent::Agent;
use crate::config::SimConfig;

/// One top/bottom barrier pair with a vertical gap.
#[derive(Clone, Debug, PartialEq)]
pub struct Gate {
    /// Leading (left) edge.
    pub x: f32,
    pub width: f32,
    /// Bottom edge of the top barrier, i.e. the sampled gap height.
    pub gap_top: f32,
    /// Top edge of the bottom barrier.
    pub gap_bottom: f32,
    /// Mask origin of the top barrier image (above the playfield when negative).
    pub top_origin: f32,
    pub playfield_height: f32,
    pub passed: bool,
}

impl Gate {
    /// Create a gate at `x` with a gap height drawn uniformly from `[gap_min, gap_max)`.
    pub fn spawn(x: f32, cfg: &SimConfig, rng: &mut impl Rng) -> Self {
        let height = rng.gen_range(cfg.gap_min..cfg.gap_max);
        let gate = Self::with_gap_height(x, height, cfg);
        log::trace!(
            "gate at {x}: top {} gap {} bottom {}",
            gate.top_extent(),
            gate.gap_size(),
            gate.bottom_extent()
        );
        gate
    }

    pub fn with_gap_height(x: f32, height: i32, cfg: &SimConfig) -> Self {
        let gap_top = height as f32;
        let bottom_extent = cfg.height - gap_top - cfg.gate_gap;
        Self {
            x,
            width: cfg.gate_width as f32,
            gap_top,
            gap_bottom: cfg.height - bottom_extent,
            top_origin: gap_top - cfg.gate_barrier_height as f32,
            playfield_height: cfg.height,
            passed: false,
        }
    }

    pub fn advance(&mut self, velocity: f32) {
        self.x -= velocity;
    }

    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }

    /// Rendered height of the top barrier inside the playfield.
    pub fn top_extent(&self) -> f32 {
        self.gap_top
    }

    /// Rendered height of the bottom barrier inside the playfield.
    pub fn bottom_extent(&self) -> f32 {
        self.playfield_height - self.gap_bottom
    }

    pub fn gap_size(&self) -> f32 {
        self.gap_bottom - self.gap_top
    }

    /// True once the trailing edge is behind the agent and the gate is not yet marked.
    pub fn is_passed_by(&self, agent: &Agent) -> bool {
        !self.passed && self.trailing_edge() < agent.pos.x
    }

    pub fn is_retired(&self) -> bool {
        self.trailing_edge() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use ::rand::SeedableRng;
    use macroquad::prelude::vec2;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn sampled_gaps_stay_in_range_and_partition_the_playfield() {
        let cfg = SimConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let gate = Gate::spawn(cfg.width, &cfg, &mut rng);
            assert!(gate.gap_top >= cfg.gap_min as f32 && gate.gap_top < cfg.gap_max as f32);
            assert!(gate.top_extent() >= 0.0);
            assert!(gate.bottom_extent() >= 0.0);
            assert!(gate.gap_top <= gate.gap_bottom);
            assert_eq!(gate.gap_size(), cfg.gate_gap);
            assert_eq!(
                gate.top_extent() + gate.gap_size() + gate.bottom_extent(),
                cfg.height
            );
        }
    }

    #[test]
    fn geometry_matches_gap_height() {
        let cfg = SimConfig::default();
        let gate = Gate::with_gap_height(500.0, 200, &cfg);
        assert_eq!(gate.gap_top, 200.0);
        assert_eq!(gate.gap_bottom, 390.0);
        assert_eq!(gate.top_origin, 200.0 - 640.0);
        assert_eq!(gate.bottom_extent(), 410.0);
    }

    #[test]
    fn passing_requires_trailing_edge_behind_agent() {
        let cfg = SimConfig::default();
        let agent = Agent::new(AgentId(0), vec2(225.0, 300.0));
        let mut gate = Gate::with_gap_height(121.0, 200, &cfg);
        assert!(!gate.is_passed_by(&agent));
        gate.advance(1.0);
        assert!(gate.is_passed_by(&agent));
        gate.passed = true;
        assert!(!gate.is_passed_by(&agent));
    }

    #[test]
    fn retires_at_left_boundary() {
        let cfg = SimConfig::default();
        let mut gate = Gate::with_gap_height(-99.0, 200, &cfg);
        assert!(!gate.is_retired());
        gate.advance(5.0);
        assert!(gate.is_retired());
    }
}
