//! Time evolution of the initial spectrum via the deep-water dispersion relation.

use rustfft::num_complex::Complex32;

use crate::dispatch::Dispatcher;
use crate::error::{OceanError, Result};
use crate::grid::{ComplexGrid, Resolution};
use crate::params::{SpectrumParameters, GRAVITY_M_PER_S2};
use crate::spectrum::{wavevector, InitialSpectrumPair};

/// Wavenumbers below this are the DC term (no horizontal displacement)
const MIN_WAVENUMBER: f32 = 1e-5;

/// Displacement-component spectra at one instant
///
/// Only valid for `time_s`; never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct FourierComponentSet {
    pub x: ComplexGrid,
    pub y: ComplexGrid,
    pub z: ComplexGrid,
    pub time_s: f32,
}

impl FourierComponentSet {
    pub fn resolution(&self) -> Resolution {
        self.y.resolution()
    }

    /// Components in (X, Y, Z) order
    pub fn into_components(self) -> [ComplexGrid; 3] {
        [self.x, self.y, self.z]
    }
}

/// Deep-water dispersion ω(k) = sqrt(g·|k|)
#[inline]
pub fn dispersion(k_len: f32) -> f32 {
    (GRAVITY_M_PER_S2 * k_len).sqrt()
}

/// Evolves h̃₀ to h̃(k, t) and derives the choppiness spectra
pub struct TimeEvolver<'a, D: Dispatcher> {
    dispatcher: &'a D,
}

impl<'a, D: Dispatcher> TimeEvolver<'a, D> {
    pub fn new(dispatcher: &'a D) -> Self {
        Self { dispatcher }
    }

    /// h̃(k,t) = h̃₀(k)·e^{iωt} + conj(h̃₀(−k))·e^{−iωt}
    ///
    /// X and Z are `λ · i·k_x/|k| · h̃` and `λ · i·k_z/|k| · h̃`, zero at k = 0
    /// and on the Nyquist row and column (index 0), where −k wraps onto the
    /// same cell and `i·k̂` would break Hermitian symmetry.
    pub fn evolve(
        &self,
        spectrum: &InitialSpectrumPair,
        params: &SpectrumParameters,
        t: f32,
    ) -> Result<FourierComponentSet> {
        if !t.is_finite() {
            return Err(OceanError::InvalidParameter {
                name: "time_s",
                value: t,
            });
        }
        let resolution = params.resolution()?;
        spectrum.positive.check_shape(resolution)?;
        spectrum.negative.check_shape(resolution)?;

        let n = resolution.n();
        let patch = params.patch_length_m;
        let zero = Complex32::new(0.0, 0.0);

        let mut height = ComplexGrid::filled(resolution, zero);
        self.dispatcher.dispatch(&mut height, |x, y| {
            let k = wavevector(x, y, n, patch);
            let omega_t = dispersion(k.length()) * t;
            let phase = Complex32::new(omega_t.cos(), omega_t.sin());
            *spectrum.positive.get(x, y) * phase + *spectrum.negative.get(x, y) * phase.conj()
        });

        let chop = |axis: usize| {
            let mut out = ComplexGrid::filled(resolution, zero);
            self.dispatcher.dispatch(&mut out, |x, y| {
                if x == 0 || y == 0 {
                    return zero;
                }
                let k = wavevector(x, y, n, patch);
                let k_len = k.length();
                if k_len < MIN_WAVENUMBER {
                    return zero;
                }
                let component = if axis == 0 { k.x } else { k.y };
                let direction = component / k_len;
                Complex32::new(0.0, direction * params.choppiness) * *height.get(x, y)
            });
            out
        };
        let x = chop(0);
        let z = chop(1);

        Ok(FourierComponentSet {
            x,
            y: height,
            z,
            time_s: t,
        })
    }
}
