//! Sign correction and normalization of raw inverse-FFT output.

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::grid::{ComplexGrid, RealGrid, Resolution};

/// (−1)^(x+y): undoes the half-grid shift of the centered spectrum
#[inline]
pub fn checkerboard_sign(x: usize, y: usize) -> f32 {
    if (x + y) % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Converts an unscaled inverse-FFT grid into a spatial displacement grid
pub struct Inversion<'a, D: Dispatcher> {
    dispatcher: &'a D,
}

impl<'a, D: Dispatcher> Inversion<'a, D> {
    pub fn new(dispatcher: &'a D) -> Self {
        Self { dispatcher }
    }

    /// `(−1)^(x+y) · Re(c) / N²` for every cell
    pub fn invert(&self, fft_result: &ComplexGrid, resolution: Resolution) -> Result<RealGrid> {
        fft_result.check_shape(resolution)?;
        let scale = 1.0 / resolution.cells() as f32;

        let mut out = RealGrid::filled(resolution, 0.0);
        self.dispatcher.dispatch(&mut out, |x, y| {
            checkerboard_sign(x, y) * fft_result.get(x, y).re * scale
        });
        Ok(out)
    }
}
