use crate::agent::Agent;
use crate::config::{self, SimConfig};

/// Vertical motion model shared by every agent in a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kinematics {
    pub jump_velocity: f32,
    pub gravity: f32,
    pub terminal_displacement: f32,
    pub upward_boost: f32,
    pub max_tilt: f32,
    pub tilt_rate: f32,
    pub tilt_hold_margin: f32,
}

impl Kinematics {
    pub fn from_config(cfg: &SimConfig) -> Self {
        Self {
            jump_velocity: cfg.jump_velocity,
            gravity: cfg.gravity,
            terminal_displacement: cfg.terminal_displacement,
            upward_boost: cfg.upward_boost,
            max_tilt: cfg.max_tilt,
            tilt_rate: cfg.tilt_rate,
            tilt_hold_margin: cfg.tilt_hold_margin,
        }
    }

    /// Raw displacement `t` ticks after a jump with velocity `v0`, before clamping.
    pub fn raw_displacement(&self, v0: f32, t: u32) -> f32 {
        let t = t as f32;
        v0 * t + self.gravity * t * t
    }

    /// Clamp to terminal velocity going down; add the extra lift going up.
    pub fn clamp_displacement(&self, raw: f32) -> f32 {
        if raw > self.terminal_displacement {
            self.terminal_displacement
        } else if raw < 0.0 {
            raw - self.upward_boost
        } else {
            raw
        }
    }

    /// Integrate one tick of vertical motion and update tilt.
    /// Returns the displacement applied.
    pub fn advance(&self, agent: &mut Agent) -> f32 {
        agent.ticks_since_jump += 1;
        let displacement =
            self.clamp_displacement(self.raw_displacement(agent.velocity, agent.ticks_since_jump));
        agent.pos.y += displacement;

        if displacement < 0.0 || agent.pos.y < agent.jump_height + self.tilt_hold_margin {
            if agent.tilt < self.max_tilt {
                agent.tilt = self.max_tilt;
            }
        } else {
            agent.tilt = (agent.tilt - self.tilt_rate).max(config::MIN_TILT);
        }

        displacement
    }

    pub fn jump(&self, agent: &mut Agent) {
        agent.velocity = self.jump_velocity;
        agent.ticks_since_jump = 0;
        agent.jump_height = agent.pos.y;
    }
}

impl Default for Kinematics {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use ::rand::{Rng, SeedableRng};
    use macroquad::prelude::vec2;
    use rand_chacha::ChaCha8Rng;

    fn agent_at(y: f32) -> Agent {
        Agent::new(AgentId(0), vec2(225.0, y))
    }

    #[test]
    fn free_fall_reaches_terminal_displacement() {
        let k = Kinematics::default();
        let mut a = agent_at(300.0);
        let steps: Vec<f32> = (0..6).map(|_| k.advance(&mut a)).collect();
        assert_eq!(steps, vec![1.5, 6.0, 13.5, 16.0, 16.0, 16.0]);
        assert_eq!(a.pos.y, 300.0 + 1.5 + 6.0 + 13.5 + 48.0);
    }

    #[test]
    fn displacement_is_clamped_for_any_velocity_and_tick() {
        let k = Kinematics::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..500 {
            let v0 = rng.gen_range(-30.0..30.0);
            let t = rng.gen_range(0..200);
            let raw = k.raw_displacement(v0, t);
            let d = k.clamp_displacement(raw);
            if raw > 16.0 {
                assert_eq!(d, 16.0);
            }
            assert!(d <= 16.0);
        }
    }

    #[test]
    fn jump_moves_up_with_extra_lift() {
        let k = Kinematics::default();
        let mut a = agent_at(300.0);
        k.jump(&mut a);
        assert_eq!(a.jump_height, 300.0);

        // -10.5 + 1.5 = -9, minus the 2px lift.
        assert_eq!(k.advance(&mut a), -11.0);
        assert_eq!(a.pos.y, 289.0);
        assert_eq!(a.tilt, 25.0);
    }

    #[test]
    fn tilt_drops_by_rate_and_stops_at_floor() {
        let k = Kinematics::default();
        let mut a = agent_at(100.0);
        a.jump_height = -1000.0;
        let tilts: Vec<f32> = (0..7)
            .map(|_| {
                k.advance(&mut a);
                a.tilt
            })
            .collect();
        assert_eq!(tilts, vec![-20.0, -40.0, -60.0, -80.0, -90.0, -90.0, -90.0]);
    }

    #[test]
    fn tilt_stays_in_range_for_random_jump_sequences() {
        let k = Kinematics::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut a = agent_at(400.0);
        for _ in 0..2000 {
            if rng.gen_bool(0.1) {
                k.jump(&mut a);
            }
            k.advance(&mut a);
            assert!((-90.0..=25.0).contains(&a.tilt), "tilt {}", a.tilt);
        }
    }
}
