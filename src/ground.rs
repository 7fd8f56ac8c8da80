use crate::config::SimConfig;

/// Two floor segments leapfrogging each other to fake an endless floor.
#[derive(Clone, Debug, PartialEq)]
pub struct Ground {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
    pub segment_width: f32,
}

impl Ground {
    pub fn new(cfg: &SimConfig) -> Self {
        Self {
            x1: 0.0,
            x2: cfg.ground_segment_width,
            y: cfg.ground_y(),
            segment_width: cfg.ground_segment_width,
        }
    }

    /// Scroll left; a segment that leaves the screen is re-placed right after the other.
    pub fn advance(&mut self, velocity: f32) {
        self.x1 -= velocity;
        self.x2 -= velocity;
        if self.x1 + self.segment_width < 0.0 {
            self.x1 = self.x2 + self.segment_width;
        }
        if self.x2 + self.segment_width < 0.0 {
            self.x2 = self.x1 + self.segment_width;
        }
    }

    /// True if the two segments together cover `[0, width)` with no seam gap.
    pub fn covers(&self, width: f32) -> bool {
        let (a, b) = if self.x1 <= self.x2 {
            (self.x1, self.x2)
        } else {
            (self.x2, self.x1)
        };
        let contiguous = (b - (a + self.segment_width)).abs() < 1e-3;
        contiguous && a <= 0.0 && b + self.segment_width >= width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_stay_seamless_while_scrolling() {
        let cfg = SimConfig::default();
        let mut ground = Ground::new(&cfg);
        for _ in 0..5000 {
            ground.advance(cfg.scroll_velocity);
            assert!(ground.covers(cfg.width), "{ground:?}");
        }
    }

    #[test]
    fn first_segment_wraps_behind_second() {
        let cfg = SimConfig::default();
        let mut ground = Ground::new(&cfg);
        ground.x1 = -670.0;
        ground.x2 = 2.0;
        ground.advance(5.0);
        assert_eq!(ground.x2, -3.0);
        assert_eq!(ground.x1, -3.0 + 672.0);
    }
}
