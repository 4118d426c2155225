//! Initial Phillips spectrum synthesis.
//!
//! Cell `(n, m)` represents the wavevector
//! `k = 2π (n − N/2, m − N/2) / L`, so the spectrum is centered on the grid and
//! the inverse FFT needs the checkerboard sign correction applied in
//! [`crate::inversion`].

use glam::Vec2;
use rustfft::num_complex::Complex32;
use std::f32::consts::{PI, SQRT_2};

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::grid::{ComplexGrid, NoiseGrid, Resolution};
use crate::params::SpectrumParameters;

/// Wavevectors shorter than this are treated as the DC term
const MIN_WAVENUMBER: f32 = 1e-5;

/// Initial spectrum pair h̃₀(k) and conj(h̃₀(−k))
///
/// `negative` at cell k is the conjugate of `positive` at cell −k (mod N),
/// which keeps the evolved height spectrum Hermitian and the spatial field
/// real.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialSpectrumPair {
    pub positive: ComplexGrid,
    pub negative: ComplexGrid,
}

impl InitialSpectrumPair {
    /// Build the pair from the positive half by mirroring through the origin
    pub fn from_positive(positive: ComplexGrid) -> Self {
        let n = positive.n();
        let negative = ComplexGrid::from_fn(positive.resolution(), |x, y| {
            positive.get(mirror(x, n), mirror(y, n)).conj()
        });
        Self { positive, negative }
    }

    pub fn resolution(&self) -> Resolution {
        self.positive.resolution()
    }
}

/// Index of −k for grid index k, modulo N
#[inline]
pub fn mirror(i: usize, n: usize) -> usize {
    (n - i) % n
}

/// Wavevector for grid cell `(x, y)` of an N×N patch of side `patch_length`
#[inline]
pub fn wavevector(x: usize, y: usize, n: usize, patch_length: f32) -> Vec2 {
    let half = (n / 2) as f32;
    Vec2::new(x as f32 - half, y as f32 - half) * (2.0 * PI / patch_length)
}

/// Phillips envelope |h̃₀(k)|, already scaled by 1/√2
pub fn phillips(k: Vec2, params: &SpectrumParameters) -> f32 {
    let k_len = k.length();
    if k_len < MIN_WAVENUMBER {
        return 0.0;
    }
    let k_sq = k_len * k_len;
    let largest = params.largest_wave_m();
    let cutoff = params.small_wave_cutoff_m;

    let alignment = (k / k_len).dot(params.wind_unit());
    let directional = alignment.powi(4);

    let power = params.amplitude / (k_sq * k_sq)
        * directional
        * (-1.0 / (k_sq * largest * largest)).exp()
        * (-k_sq * cutoff * cutoff).exp();

    if !power.is_finite() {
        // A / k⁴ overflows for extreme amplitudes on tiny patches
        return 0.0;
    }
    power.sqrt() / SQRT_2
}

/// Box–Muller transform of two uniforms in (0, 1] into a complex Gaussian
#[inline]
pub fn gaussian_pair(u0: f32, u1: f32) -> Complex32 {
    let radius = (-2.0 * u0.ln()).sqrt();
    let theta = 2.0 * PI * u1;
    Complex32::new(radius * theta.cos(), radius * theta.sin())
}

/// Generates the initial spectrum pair from noise and wind parameters
pub struct SpectrumGenerator<'a, D: Dispatcher> {
    dispatcher: &'a D,
}

impl<'a, D: Dispatcher> SpectrumGenerator<'a, D> {
    pub fn new(dispatcher: &'a D) -> Self {
        Self { dispatcher }
    }

    /// Synthesize h̃₀ from `noise` under `params`
    ///
    /// Channels 0/1 drive the Gaussian draw of each cell. Self-mirrored cells
    /// (k ≡ −k mod N) draw from channels 2/3 instead, so they stay
    /// independent of the mirrored partner they coincide with.
    pub fn generate(
        &self,
        noise: &NoiseGrid,
        params: &SpectrumParameters,
    ) -> Result<InitialSpectrumPair> {
        let resolution = params.validate()?;
        noise.check_shape(resolution)?;
        Ok(self.synthesize(noise, params, resolution))
    }

    /// Synthesis proper; `params` and `noise` are already checked against
    /// `resolution`
    pub(crate) fn synthesize(
        &self,
        noise: &NoiseGrid,
        params: &SpectrumParameters,
        resolution: Resolution,
    ) -> InitialSpectrumPair {
        let n = resolution.n();

        let mut positive = ComplexGrid::filled(resolution, Complex32::new(0.0, 0.0));
        self.dispatcher.dispatch(&mut positive, |x, y| {
            let k = wavevector(x, y, n, params.patch_length_m);
            let [u0, u1, u2, u3] = *noise.get(x, y);
            let draw = if mirror(x, n) == x && mirror(y, n) == y {
                gaussian_pair(u2, u3)
            } else {
                gaussian_pair(u0, u1)
            };
            draw * phillips(k, params)
        });

        log::debug!(
            "generated {}x{} initial spectrum (L={}m, A={}, V={}m/s)",
            n,
            n,
            params.patch_length_m,
            params.amplitude,
            params.wind_speed_m_per_s
        );

        InitialSpectrumPair::from_positive(positive)
    }
}
