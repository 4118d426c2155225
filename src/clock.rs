//! Fixed-step simulation time.

/// Advances simulation time by a constant step per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    time_s: f32,
    step_s: f32,
    frame: u64,
}

impl SimulationClock {
    pub fn new(step_s: f32) -> Self {
        Self {
            time_s: 0.0,
            step_s,
            frame: 0,
        }
    }

    pub fn time_s(&self) -> f32 {
        self.time_s
    }

    pub fn step_s(&self) -> f32 {
        self.step_s
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Return the current time, then move one step forward
    pub fn tick(&mut self) -> f32 {
        let now = self.time_s;
        self.frame += 1;
        // frame * step rather than repeated addition
        self.time_s = self.frame as f32 * self.step_s;
        now
    }

    pub fn reset(&mut self) {
        self.time_s = 0.0;
        self.frame = 0;
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(0.003)
    }
}
