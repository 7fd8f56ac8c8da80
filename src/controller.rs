use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;

use crate::error::ControllerError;

/// What an agent's controller sees each tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Observation {
    pub self_y: f32,
    /// Unsigned vertical distance to the active gate's top barrier edge.
    pub dist_to_top: f32,
    /// Unsigned vertical distance to the active gate's bottom barrier edge.
    pub dist_to_bottom: f32,
}

impl Observation {
    pub fn as_inputs(&self) -> [f32; 3] {
        [self.self_y, self.dist_to_top, self.dist_to_bottom]
    }
}

/// Decision source for one agent: a human, a script, or a trained network.
///
/// Called once per live agent per tick. Implementations may keep state.
pub trait Controller {
    fn decide(&mut self, obs: &Observation) -> Result<bool, ControllerError>;
}

/// Never jumps.
#[cfg(test)]
#[derive(Clone, Copy, Debug, Default)]
pub struct Idle;

#[cfg(test)]
impl Controller for Idle {
    fn decide(&mut self, _obs: &Observation) -> Result<bool, ControllerError> {
        Ok(false)
    }
}

/// Jumps whenever the agent drops within `margin` of the gap's lower edge.
#[derive(Clone, Copy, Debug)]
pub struct Threshold {
    pub margin: f32,
    /// Gap size of the run, used to tell "below the gap" from "inside it".
    pub gap: f32,
}

impl Threshold {
    pub fn new(margin: f32, gap: f32) -> Self {
        Self { margin, gap }
    }
}

impl Controller for Threshold {
    fn decide(&mut self, obs: &Observation) -> Result<bool, ControllerError> {
        // Outside the gap the two distances add up to more than the gap.
        let outside = obs.dist_to_top + obs.dist_to_bottom > self.gap + 0.01;
        let below = outside && obs.dist_to_top > obs.dist_to_bottom;
        let offset = if below {
            obs.dist_to_bottom
        } else {
            -obs.dist_to_bottom
        };
        Ok(offset > -self.margin)
    }
}

/// Latch filled by the input layer and drained by [`Human`] once per tick.
#[derive(Clone, Debug, Default)]
pub struct JumpLatch(Rc<Cell<bool>>);

impl JumpLatch {
    pub fn press(&self) {
        self.0.set(true);
    }

    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}

/// Keyboard/mouse driven controller for interactive play.
#[derive(Clone, Debug, Default)]
pub struct Human {
    latch: JumpLatch,
}

impl Human {
    pub fn new(latch: JumpLatch) -> Self {
        Self { latch }
    }
}

impl Controller for Human {
    fn decide(&mut self, _obs: &Observation) -> Result<bool, ControllerError> {
        Ok(self.latch.take())
    }
}

/// Adapts a closure into a controller.
#[cfg(test)]
pub struct FnController<F>(pub F);

#[cfg(test)]
impl<F> Controller for FnController<F>
where
    F: FnMut(&Observation) -> Result<bool, ControllerError>,
{
    fn decide(&mut self, obs: &Observation) -> Result<bool, ControllerError> {
        (self.0)(obs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(y: f32, top: f32, bottom: f32) -> Observation {
        Observation {
            self_y: y,
            dist_to_top: (y - top).abs(),
            dist_to_bottom: (y - bottom).abs(),
        }
    }

    #[test]
    fn threshold_jumps_only_near_or_below_the_gap_floor() {
        let mut c = Threshold::new(110.0, 260.0);
        // Gap spans 200..460.
        assert!(!c.decide(&obs(250.0, 200.0, 460.0)).unwrap());
        assert!(c.decide(&obs(360.0, 200.0, 460.0)).unwrap());
        assert!(c.decide(&obs(600.0, 200.0, 460.0)).unwrap());
        assert!(!c.decide(&obs(50.0, 200.0, 460.0)).unwrap());
    }

    #[test]
    fn threshold_tolerates_a_wider_gap_than_configured() {
        let mut c = Threshold::new(110.0, 190.0);
        // Actual gap spans 200..460, wider than the 190 the controller expects.
        assert!(c.decide(&obs(600.0, 200.0, 460.0)).unwrap());
        assert!(!c.decide(&obs(250.0, 200.0, 460.0)).unwrap());
        assert!(!c.decide(&obs(50.0, 200.0, 460.0)).unwrap());
    }

    #[test]
    fn human_consumes_each_press_once() {
        let latch = JumpLatch::default();
        let mut human = Human::new(latch.clone());
        let o = obs(0.0, 0.0, 0.0);
        assert!(!human.decide(&o).unwrap());
        latch.press();
        latch.press();
        assert!(human.decide(&o).unwrap());
        assert!(!human.decide(&o).unwrap());
    }
}
