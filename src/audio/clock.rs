/// The two time bases the engine reads.
///
/// `unscaled` always advances; `scaled` stops while the game is paused.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineClock {
    scaled: f64,
    unscaled: f64,
}

impl EngineClock {
    pub fn advance(&mut self, dt: f32, paused: bool) {
        let dt = dt.max(0.0) as f64;
        self.unscaled += dt;
        if !paused {
            self.scaled += dt;
        }
    }

    /// Seconds of unpaused time.
    pub fn scaled(&self) -> f64 {
        self.scaled
    }

    /// Seconds of wall time since the engine started ticking.
    pub fn unscaled(&self) -> f64 {
        self.unscaled
    }

    /// `scaled` when `respect_pause`, else `unscaled`.
    pub fn now(&self, respect_pause: bool) -> f64 {
        if respect_pause {
            self.scaled
        } else {
            self.unscaled
        }
    }
}
