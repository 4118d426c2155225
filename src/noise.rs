//! Noise generation for spectrum phases.
//!
//! Produces four independent uniform channels per grid cell, the same layout
//! a GPU noise pass would write into an RGBA32F texture.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::{NoiseGrid, Resolution};

/// Seeded white-noise source for spectrum synthesis
pub struct NoiseSource {
    seed: u64,
}

impl NoiseSource {
    /// Create new noise source with seed
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Sample an N×N grid of four uniform channels
    ///
    /// Values lie in (0, 1], so `ln(u)` in Box–Muller stays finite.
    /// The same seed and resolution always reproduce the same grid.
    pub fn sample(&self, resolution: Resolution) -> NoiseGrid {
        let mut rng = StdRng::seed_from_u64(self.seed);
        NoiseGrid::from_fn(resolution, |_, _| {
            [
                unit_open_low(&mut rng),
                unit_open_low(&mut rng),
                unit_open_low(&mut rng),
                unit_open_low(&mut rng),
            ]
        })
    }
}

/// Uniform sample in (0, 1]
fn unit_open_low(rng: &mut StdRng) -> f32 {
    1.0 - rng.gen::<f32>()
}
